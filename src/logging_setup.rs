//! 统一日志系统初始化模块
//!
//! 控制台输出层 + 可选的按天滚动文件层，返回的guard需要由main持有到进程结束

use crate::config::LoggingConfig;
use crate::error::{AppError, Result};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// 自定义Guard trait，避免dyn Drop警告
pub trait LogGuard: Send + Sync {}

/// 未启用文件日志时的占位guard
pub struct DummyGuard;

impl LogGuard for DummyGuard {}

impl LogGuard for tracing_appender::non_blocking::WorkerGuard {}

/// 组装过滤器字符串，`RUST_LOG` 优先于配置文件
pub fn build_filter_string(config: &LoggingConfig) -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!("{},hyper=warn,tower_http=info", config.log_level)
    })
}

/// 初始化日志系统
pub fn init_logging(config: &LoggingConfig) -> Result<Box<dyn LogGuard>> {
    let filter_str = build_filter_string(config);

    let console_layer = if config.enable_console_output {
        Some(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_level(true)
                .with_filter(EnvFilter::new(&filter_str)),
        )
    } else {
        None
    };

    let (file_layer, guard): (Option<_>, Box<dyn LogGuard>) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "tera_trace.log");
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(&filter_str));
            (Some(layer), Box::new(worker_guard) as Box<dyn LogGuard>)
        }
        None => (None, Box::new(DummyGuard) as Box<dyn LogGuard>),
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::ConfigError(format!("日志系统初始化失败: {}", e)))?;

    Ok(guard)
}
