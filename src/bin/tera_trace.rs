//! TeraTrace - 本地开发用日志采集器
//!
//! 接收被测进程推送的JSON日志，保留最近窗口并实时推送给观察者

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tera_trace::{
    logging_setup::init_logging,
    server::run_collector,
    Collector, TraceConfig, TracingSink,
};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tera_trace")]
#[command(about = "TeraTrace 本地日志/追踪采集器")]
#[command(version)]
struct Cli {
    /// 配置文件路径，默认读取 CONFIG_PATH 或 config/TeraTraceConfig.toml
    #[arg(short, long)]
    config: Option<String>,

    /// 请求式采集端点地址
    #[arg(long)]
    http_addr: Option<String>,

    /// 流式采集端点地址
    #[arg(long)]
    ws_addr: Option<String>,

    /// 只读查询接口地址
    #[arg(long)]
    api_addr: Option<String>,

    /// 每个服务最多保留的日志条数
    #[arg(long)]
    max_logs: Option<usize>,

    /// 日志级别
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_config(&self) -> tera_trace::Result<TraceConfig> {
        let mut config = match &self.config {
            Some(path) => TraceConfig::from_file(path)?,
            None => TraceConfig::load()?,
        };

        if let Some(addr) = &self.http_addr {
            config.server.http_addr = addr.clone();
        }
        if let Some(addr) = &self.ws_addr {
            config.server.ws_addr = addr.clone();
        }
        if let Some(addr) = &self.api_addr {
            config.server.api_addr = addr.clone();
        }
        if let Some(max_logs) = self.max_logs {
            config.storage.max_logs_per_service = max_logs;
        }
        if let Some(level) = &self.log_level {
            config.logging.log_level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let _guard = init_logging(&config.logging)?;

    info!(
        max_logs_per_service = config.storage.max_logs_per_service,
        viewer_queue_capacity = config.broadcast.viewer_queue_capacity,
        "启动TeraTrace采集器"
    );
    print_startup_info(&config);

    let collector = Arc::new(Collector::new(&config, Arc::new(TracingSink)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("收到Ctrl+C，开始关闭"),
            Err(e) => error!("无法监听Ctrl+C信号: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = run_collector(&config, collector, shutdown_rx).await {
        error!(error_type = e.error_type_summary(), "采集器异常退出: {}", e);
        return Err(e.into());
    }

    info!("TeraTrace已退出");
    Ok(())
}

/// 打印启动信息
fn print_startup_info(config: &TraceConfig) {
    println!();
    println!("TeraTrace - 本地日志采集器");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📡 日志API: POST http://{}/ingest", config.server.http_addr);
    println!("🔗 WebSocket: ws://{}/ws", config.server.ws_addr);
    println!("📊 查询接口: http://{}/api/logs", config.server.api_addr);
    println!("👀 只读订阅: ws://{}/ws", config.server.api_addr);
    println!("💾 每个服务保留: {} 条", config.storage.max_logs_per_service);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
