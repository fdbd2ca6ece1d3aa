//! TeraTrace - 本地开发用日志/追踪采集器
//!
//! 采集 → 翻译 → 保留 → 去重 → 广播

pub mod aggregator;
pub mod broadcaster;
pub mod collector;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ingestion;
pub mod logging_setup;
pub mod models;
pub mod server;
pub mod storage;
pub mod translator;
pub mod web_server;

// 重新导出核心类型
pub use aggregator::Aggregator;
pub use broadcaster::{Broadcaster, Viewer};
pub use collector::Collector;
pub use config::TraceConfig;
pub use diagnostics::{DiagnosticSink, Severity, TracingSink};
pub use error::{AppError, Result};
pub use models::{IngestChannel, LogEntry};
pub use storage::MemoryStore;
pub use translator::translate;
