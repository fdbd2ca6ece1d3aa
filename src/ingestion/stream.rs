use super::COMPONENT_STREAM;
use crate::collector::Collector;
use crate::diagnostics::Severity;
use crate::error::AppError;
use crate::models::{IngestChannel, LogEntry};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// 连接是否接收客户端推送的日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// 既是观察者也是采集通道
    Ingest,
    /// 只观察，客户端消息被忽略
    ViewOnly,
}

/// 创建流式采集路由
pub fn create_stream_router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/ws", get(stream_handler))
        .with_state(collector)
}

async fn stream_handler(
    ws: WebSocketUpgrade,
    State(collector): State<Arc<Collector>>,
) -> Response {
    ws.on_upgrade(move |socket| stream_connection(socket, collector, StreamMode::Ingest))
}

/// WebSocket连接处理：注册并取快照 → 回放历史 → 实时转发 + 接收客户端推送
pub async fn stream_connection(socket: WebSocket, collector: Arc<Collector>, mode: StreamMode) {
    let viewer = collector.join_viewer();
    let viewer_id = viewer.id;
    let mut live_rx = viewer.receiver;
    let (mut sender, mut receiver) = socket.split();

    // === 阶段1：回放历史，期间不读取客户端输入 ===
    for entry in viewer.backlog {
        if let Err(e) = send_log_entry(&mut sender, &entry).await {
            report_transport_failure(&collector, viewer_id, &e);
            collector.leave_viewer(viewer_id);
            return;
        }
    }

    // === 阶段2：实时转发 + 接收客户端消息 ===
    loop {
        tokio::select! {
            live = live_rx.recv() => {
                match live {
                    Some(entry) => {
                        if let Err(e) = send_log_entry(&mut sender, &entry).await {
                            report_transport_failure(&collector, viewer_id, &e);
                            break;
                        }
                    }
                    None => {
                        // 广播器因队列积压移除了本连接
                        collector.sink().log(
                            Severity::Warn,
                            COMPONENT_STREAM,
                            &format!("连接 #{} 处理速度过慢，已断开", viewer_id),
                        );
                        break;
                    }
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(frame @ (Message::Text(_) | Message::Binary(_)))) => {
                        let payload = frame.into_data();
                        if handle_client_payload(&collector, viewer_id, mode, &payload).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        collector.sink().log(
                            Severity::Debug,
                            COMPONENT_STREAM,
                            &format!("连接 #{} 客户端主动断开", viewer_id),
                        );
                        break;
                    }
                    // ping/pong由axum处理
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let error = AppError::TransportFailure(e.to_string());
                        report_transport_failure(&collector, viewer_id, &error);
                        break;
                    }
                }
            }
        }
    }

    collector.leave_viewer(viewer_id);
    let _ = sender.close().await;
}

/// 处理客户端推送的一帧
///
/// 帧不是合法的JSON对象时视为流已损坏，返回错误由调用方结束连接
fn handle_client_payload(
    collector: &Collector,
    viewer_id: u64,
    mode: StreamMode,
    payload: &[u8],
) -> Result<(), AppError> {
    if mode == StreamMode::ViewOnly {
        return Ok(());
    }

    match collector.ingest(payload, IngestChannel::WebSocket) {
        Ok(entry) => {
            collector.sink().log(
                Severity::Debug,
                COMPONENT_STREAM,
                &format!("连接 #{} 推送了服务 {} 的日志", viewer_id, entry.service),
            );
            Ok(())
        }
        Err(e) => {
            collector.sink().log(
                Severity::Warn,
                COMPONENT_STREAM,
                &format!("连接 #{} 消息格式错误，断开连接: {}", viewer_id, e),
            );
            Err(e)
        }
    }
}

fn report_transport_failure(collector: &Collector, viewer_id: u64, error: &AppError) {
    collector.sink().log(
        Severity::Info,
        COMPONENT_STREAM,
        &format!("连接 #{} 传输中断: {}", viewer_id, error),
    );
}

/// 发送日志条目到WebSocket客户端
async fn send_log_entry(
    sender: &mut SplitSink<WebSocket, Message>,
    entry: &LogEntry,
) -> Result<(), AppError> {
    let json = serde_json::to_string(entry)
        .map_err(|e| AppError::TransportFailure(format!("序列化失败: {}", e)))?;
    sender
        .send(Message::Text(json))
        .await
        .map_err(|e| AppError::TransportFailure(e.to_string()))
}
