//! 采集端点
//!
//! - `http`: 请求式端点 `POST /ingest`，每次调用一个JSON对象
//! - `stream`: 流式端点 `/ws`，连接即注册为观察者，先回放后实时，同时接收客户端推送

pub mod http;
pub mod stream;

pub use http::create_ingest_router;
pub use stream::create_stream_router;

pub const COMPONENT_INGEST: &str = "INGEST";
pub const COMPONENT_STREAM: &str = "STREAM";
