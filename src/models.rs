use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 服务名缺失时在存储和聚合中使用的归属名
pub const UNKNOWN_SERVICE: &str = "UNKNOWN";

/// 默认日志级别
pub const DEFAULT_LEVEL: &str = "INFO";

/// 规范化后的日志条目
///
/// 所有采集入口收到的负载都先被翻译成这个结构，再交给存储、聚合器和广播器。
/// 翻译完成后条目不可变，各组件通过 `Arc<LogEntry>` 共享同一份数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Level")]
    pub level: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "TraceID", default, skip_serializing_if = "String::is_empty")]
    pub trace_id: String,
    #[serde(rename = "SessionID", default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(rename = "Metadata", default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LogEntry {
    /// 存储和聚合使用的服务键，空服务名归入 `UNKNOWN`
    pub fn service_key(&self) -> &str {
        if self.service.is_empty() {
            UNKNOWN_SERVICE
        } else {
            &self.service
        }
    }

    pub fn has_trace_id(&self) -> bool {
        !self.trace_id.is_empty()
    }
}

/// 采集通道，决定负载缺少 `Service` 时的默认归属
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestChannel {
    Http,
    WebSocket,
}

impl IngestChannel {
    pub fn default_service(&self) -> &'static str {
        match self {
            IngestChannel::Http => "HTTP",
            IngestChannel::WebSocket => "WS",
        }
    }
}
