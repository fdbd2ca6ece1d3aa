//! 日志翻译模块
//!
//! 把任意JSON对象翻译成规范的 `LogEntry`：
//! - 识别 `Timestamp`、`Level`、`Message`、`Service`、`TraceID`、`SessionID`
//! - 缺失或类型不符的字段静默回退为默认值，不作为错误
//! - 其余顶层字段原样放入 `metadata`

use crate::error::{AppError, Result};
use crate::models::{LogEntry, DEFAULT_LEVEL};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const KEY_TIMESTAMP: &str = "Timestamp";
const KEY_LEVEL: &str = "Level";
const KEY_MESSAGE: &str = "Message";
const KEY_SERVICE: &str = "Service";
const KEY_TRACE_ID: &str = "TraceID";
const KEY_SESSION_ID: &str = "SessionID";

const RECOGNIZED_KEYS: [&str; 6] = [
    KEY_TIMESTAMP,
    KEY_LEVEL,
    KEY_MESSAGE,
    KEY_SERVICE,
    KEY_TRACE_ID,
    KEY_SESSION_ID,
];

/// 翻译原始字节负载
///
/// 负载不是合法的JSON对象时返回 `MalformedPayload`
pub fn translate(raw: &[u8], default_service: &str) -> Result<LogEntry> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| AppError::MalformedPayload(e.to_string()))?;
    translate_value(value, default_service)
}

/// 翻译已解析的JSON值
pub fn translate_value(value: Value, default_service: &str) -> Result<LogEntry> {
    match value {
        Value::Object(object) => Ok(translate_object(object, default_service)),
        other => Err(AppError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn translate_object(mut object: Map<String, Value>, default_service: &str) -> LogEntry {
    let timestamp = object
        .get(KEY_TIMESTAMP)
        .and_then(|v| v.as_str())
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    let level = string_field(&object, KEY_LEVEL).unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    let message = match object.get(KEY_MESSAGE) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    // 空字符串视同缺失，保证翻译后的服务名来自通道默认值
    let service = string_field(&object, KEY_SERVICE)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_service.to_string());

    let trace_id = string_field(&object, KEY_TRACE_ID).unwrap_or_default();
    let session_id = string_field(&object, KEY_SESSION_ID).unwrap_or_default();

    for key in RECOGNIZED_KEYS {
        object.remove(key);
    }

    LogEntry {
        timestamp,
        level,
        message,
        service,
        trace_id,
        session_id,
        metadata: object.into_iter().collect(),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
