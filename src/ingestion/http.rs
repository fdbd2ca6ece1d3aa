use super::COMPONENT_INGEST;
use crate::collector::Collector;
use crate::diagnostics::Severity;
use crate::error::AppError;
use crate::models::IngestChannel;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

/// 创建请求式采集路由
pub fn create_ingest_router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/ingest", any(ingest_handler))
        // 本地采集不限制请求体大小
        .layer(DefaultBodyLimit::disable())
        .with_state(collector)
}

/// 处理一次采集请求
///
/// 非POST返回405，JSON无法解析或不是对象返回400，翻译失败返回500，成功返回空的200
async fn ingest_handler(
    State(collector): State<Arc<Collector>>,
    method: Method,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let sink = collector.sink();

    if method != Method::POST {
        sink.log(
            Severity::Warn,
            COMPONENT_INGEST,
            &format!("拒绝非POST请求: {}", method),
        );
        return Err(AppError::UnsupportedMethod(method.to_string()));
    }

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        sink.log(Severity::Error, COMPONENT_INGEST, "JSON负载格式错误");
        AppError::MalformedPayload(e.to_string())
    })?;

    if !value.is_object() {
        sink.log(Severity::Error, COMPONENT_INGEST, "JSON负载不是对象");
        return Err(AppError::MalformedPayload("expected a JSON object".to_string()));
    }

    let entry = collector
        .ingest_value(value, IngestChannel::Http)
        .map_err(|e| {
            sink.log(
                Severity::Error,
                COMPONENT_INGEST,
                &format!("翻译失败: {}", e),
            );
            AppError::TranslationFailed(e.to_string())
        })?;

    sink.log(
        Severity::Info,
        COMPONENT_INGEST,
        &format!("已处理服务 {} 的日志", entry.service),
    );

    Ok(StatusCode::OK)
}
