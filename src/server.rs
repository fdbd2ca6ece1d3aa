//! 监听器启动与优雅退出
//!
//! 三个监听器共享同一个 `Collector`：
//! - 请求式采集 (`server.http_addr`)
//! - 流式采集 (`server.ws_addr`)
//! - 只读查询 (`server.api_addr`)

use crate::collector::Collector;
use crate::config::TraceConfig;
use crate::diagnostics::Severity;
use crate::error::{AppError, Result};
use crate::ingestion::{create_ingest_router, create_stream_router};
use crate::web_server::create_app;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const COMPONENT_GATEWAY: &str = "GATEWAY";

/// 启动全部监听器，直到收到关闭信号
pub async fn run_collector(
    config: &TraceConfig,
    collector: Arc<Collector>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let http = bind(&config.server.http_addr).await?;
    let ws = bind(&config.server.ws_addr).await?;
    let api = bind(&config.server.api_addr).await?;

    let sink = collector.sink().clone();
    for (label, url) in [
        ("请求式采集端点", format!("http://{}/ingest", local_addr(&http))),
        ("流式采集端点", format!("ws://{}/ws", local_addr(&ws))),
        ("只读查询接口", format!("http://{}/api", local_addr(&api))),
    ] {
        sink.log(Severity::Info, COMPONENT_GATEWAY, &format!("{}: {}", label, url));
    }

    tokio::try_join!(
        serve(http, create_ingest_router(collector.clone()), shutdown_rx.clone()),
        serve(ws, create_stream_router(collector.clone()), shutdown_rx.clone()),
        serve(api, create_app(collector.clone()), shutdown_rx),
    )?;

    sink.log(Severity::Info, COMPONENT_GATEWAY, "所有监听器已退出");
    Ok(())
}

pub async fn bind(addr: &str) -> Result<TcpListener> {
    let addr: SocketAddr = addr.parse()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::WebServerError(format!("无法绑定到 {}: {}", addr, e)))
}

/// 在已绑定的监听器上运行路由，关闭信号到达后优雅退出
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
        .map_err(|e| AppError::WebServerError(e.to_string()))
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
}

fn local_addr(listener: &TcpListener) -> String {
    listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".to_string())
}
