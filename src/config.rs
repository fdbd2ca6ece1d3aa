//! 采集器配置模块

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// 系统配置常量
pub mod constants {
    /// 默认配置文件路径，可通过 `CONFIG_PATH` 环境变量覆盖
    pub const DEFAULT_CONFIG_PATH: &str = "config/TeraTraceConfig.toml";

    /// 请求式采集端点默认地址
    pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8090";

    /// 流式采集端点默认地址
    pub const DEFAULT_WS_ADDR: &str = "0.0.0.0:8081";

    /// 只读查询接口默认地址
    pub const DEFAULT_API_ADDR: &str = "0.0.0.0:8080";

    /// 每个服务默认保留的日志条数
    pub const DEFAULT_MAX_LOGS_PER_SERVICE: usize = 1000;

    /// 每个观察者的默认投递队列容量
    pub const DEFAULT_VIEWER_QUEUE_CAPACITY: usize = 1024;
}

use constants::*;

fn default_http_addr() -> String {
    DEFAULT_HTTP_ADDR.to_string()
}

fn default_ws_addr() -> String {
    DEFAULT_WS_ADDR.to_string()
}

fn default_api_addr() -> String {
    DEFAULT_API_ADDR.to_string()
}

fn default_max_logs_per_service() -> usize {
    DEFAULT_MAX_LOGS_PER_SERVICE
}

fn default_viewer_queue_capacity() -> usize {
    DEFAULT_VIEWER_QUEUE_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 默认启用控制台输出
fn default_enable_console_output() -> bool {
    true
}

/// 采集器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 监听地址配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 请求式采集端点 (POST /ingest)
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// 流式采集端点 (/ws)
    #[serde(default = "default_ws_addr")]
    pub ws_addr: String,

    /// 只读查询接口 (/api/*)
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            ws_addr: default_ws_addr(),
            api_addr: default_api_addr(),
        }
    }
}

/// 保留存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_max_logs_per_service")]
    pub max_logs_per_service: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_logs_per_service: default_max_logs_per_service(),
        }
    }
}

/// 广播配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// 观察者投递队列满时，该观察者被断开
    #[serde(default = "default_viewer_queue_capacity")]
    pub viewer_queue_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            viewer_queue_capacity: default_viewer_queue_capacity(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)，`RUST_LOG` 优先
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_enable_console_output")]
    pub enable_console_output: bool,

    /// 设置后额外按天滚动写入该目录
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_console_output: default_enable_console_output(),
            log_dir: None,
        }
    }
}

impl TraceConfig {
    /// 从TOML文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TraceConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 按 `CONFIG_PATH` 或默认路径加载，文件不存在时使用默认配置
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_or_default(config_path)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// 校验容量和监听地址
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_logs_per_service == 0 {
            return Err(AppError::ConfigError(
                "storage.max_logs_per_service 必须大于0".to_string(),
            ));
        }
        if self.broadcast.viewer_queue_capacity == 0 {
            return Err(AppError::ConfigError(
                "broadcast.viewer_queue_capacity 必须大于0".to_string(),
            ));
        }
        for addr in [&self.server.http_addr, &self.server.ws_addr, &self.server.api_addr] {
            addr.parse::<SocketAddr>()?;
        }
        Ok(())
    }
}
