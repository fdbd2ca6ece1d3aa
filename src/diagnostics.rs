//! 诊断日志出口
//!
//! 核心组件只通过 `DiagnosticSink` 输出诊断信息：严重级别 + 组件标签 + 消息，
//! 调用即忘，不返回错误。

use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(label)
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn log(&self, severity: Severity, component: &str, message: &str);
}

/// 转发到 `tracing` 的默认实现
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, severity: Severity, component: &str, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(target: "tera_trace", component, "{}", message),
            Severity::Info => tracing::info!(target: "tera_trace", component, "{}", message),
            Severity::Warn => tracing::warn!(target: "tera_trace", component, "{}", message),
            Severity::Error => tracing::error!(target: "tera_trace", component, "{}", message),
        }
    }
}

/// 把诊断记录保存在内存中，供测试断言
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(Severity, String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Severity, String, String)> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, severity: Severity, component: &str) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(s, c, _)| *s == severity && c == component)
            .count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn log(&self, severity: Severity, component: &str, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, component.to_string(), message.to_string()));
    }
}
