//! 只读查询接口
//!
//! 提供给外部仪表板使用：
//! - 保留存储的全部日志和单服务日志快照
//! - 聚合器的服务列表和去重后的服务日志
//! - 只观察的WebSocket实时订阅（历史回放 + 增量）
//! 不提供任何写入能力。

use crate::aggregator::{dedup_by_fingerprint, dedup_by_trace_id};
use crate::collector::Collector;
use crate::ingestion::stream::{stream_connection, StreamMode};
use crate::models::LogEntry;
use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 查询时的去重方式
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    Trace,
    Message,
}

#[derive(Deserialize, Debug, Default)]
pub struct LogQuery {
    dedup: Option<DedupMode>,
}

/// 采集器概况
#[derive(Serialize, Debug)]
pub struct CollectorStats {
    pub services: Vec<String>,
    pub retained_logs: usize,
    pub aggregated_logs: usize,
    pub viewers: usize,
    pub max_logs_per_service: usize,
}

/// 创建查询接口路由
pub fn create_app(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/api/logs", get(all_logs_handler))
        .route("/api/logs/:service", get(service_logs_handler))
        .route("/api/services", get(services_handler))
        .route("/api/aggregated/:service", get(aggregated_logs_handler))
        .route("/api/stats", get(stats_handler))
        .route("/ws", get(viewer_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}

fn apply_dedup(entries: Vec<Arc<LogEntry>>, mode: Option<DedupMode>) -> Vec<Arc<LogEntry>> {
    match mode {
        Some(DedupMode::Trace) => dedup_by_trace_id(&entries),
        Some(DedupMode::Message) => dedup_by_fingerprint(&entries),
        None => entries,
    }
}

async fn all_logs_handler(
    State(collector): State<Arc<Collector>>,
    Query(query): Query<LogQuery>,
) -> Json<HashMap<String, Vec<Arc<LogEntry>>>> {
    let logs = collector
        .store()
        .get_all()
        .into_iter()
        .map(|(service, entries)| (service, apply_dedup(entries, query.dedup)))
        .collect();
    Json(logs)
}

async fn service_logs_handler(
    State(collector): State<Arc<Collector>>,
    Path(service): Path<String>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<Arc<LogEntry>>> {
    Json(apply_dedup(collector.store().get_service(&service), query.dedup))
}

async fn services_handler(State(collector): State<Arc<Collector>>) -> Json<Vec<String>> {
    let mut services = collector.aggregator().get_all_services();
    services.sort();
    Json(services)
}

async fn aggregated_logs_handler(
    State(collector): State<Arc<Collector>>,
    Path(service): Path<String>,
) -> Json<Vec<Arc<LogEntry>>> {
    Json(collector.aggregator().get_logs(&service))
}

async fn stats_handler(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    Json(CollectorStats {
        services: collector.store().service_names(),
        retained_logs: collector.store().len(),
        aggregated_logs: collector.aggregator().len(),
        viewers: collector.broadcaster().viewer_count(),
        max_logs_per_service: collector.store().capacity(),
    })
}

/// 只观察的实时订阅
async fn viewer_handler(
    ws: WebSocketUpgrade,
    State(collector): State<Arc<Collector>>,
) -> Response {
    ws.on_upgrade(move |socket| stream_connection(socket, collector, StreamMode::ViewOnly))
}
