//! 采集管道
//!
//! 翻译后的条目在这里依次交给保留存储（经广播器）、聚合器和观察者。
//! 所有共享状态都由 `Collector` 显式持有，由进程创建后注入各端点。

use crate::aggregator::{Aggregator, Fingerprint};
use crate::broadcaster::{Broadcaster, Viewer, ViewerId};
use crate::config::TraceConfig;
use crate::diagnostics::{DiagnosticSink, Severity};
use crate::error::Result;
use crate::models::{IngestChannel, LogEntry};
use crate::storage::MemoryStore;
use crate::translator;
use serde_json::Value;
use std::sync::Arc;

pub const COMPONENT_PIPELINE: &str = "PIPELINE";
pub const COMPONENT_BROADCAST: &str = "BROADCAST";

pub struct Collector {
    store: Arc<MemoryStore>,
    aggregator: Arc<Aggregator>,
    broadcaster: Arc<Broadcaster>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Collector {
    pub fn new(config: &TraceConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        let store = Arc::new(MemoryStore::new(config.storage.max_logs_per_service));
        let broadcaster = Arc::new(Broadcaster::new(
            store.clone(),
            config.broadcast.viewer_queue_capacity,
        ));
        Self::from_parts(store, Arc::new(Aggregator::new()), broadcaster, sink)
    }

    pub fn from_parts(
        store: Arc<MemoryStore>,
        aggregator: Arc<Aggregator>,
        broadcaster: Arc<Broadcaster>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            store,
            aggregator,
            broadcaster,
            sink,
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// 翻译原始字节并进入管道
    pub fn ingest(&self, raw: &[u8], channel: IngestChannel) -> Result<Arc<LogEntry>> {
        let entry = translator::translate(raw, channel.default_service())?;
        Ok(self.ingest_entry(entry))
    }

    /// 翻译已解析的JSON值并进入管道
    pub fn ingest_value(&self, value: Value, channel: IngestChannel) -> Result<Arc<LogEntry>> {
        let entry = translator::translate_value(value, channel.default_service())?;
        Ok(self.ingest_entry(entry))
    }

    /// 存储、聚合并广播一条已翻译的条目，此后不会失败
    pub fn ingest_entry(&self, entry: LogEntry) -> Arc<LogEntry> {
        let entry = Arc::new(entry);

        let report = self.broadcaster.publish(entry.clone());
        for id in &report.lagging {
            self.sink.log(
                Severity::Warn,
                COMPONENT_BROADCAST,
                &format!("观察者 #{} 投递队列已满，已断开", id),
            );
        }
        for id in &report.closed {
            self.sink.log(
                Severity::Debug,
                COMPONENT_BROADCAST,
                &format!("观察者 #{} 接收端已关闭，已移除", id),
            );
        }

        if !self.aggregator.add_log(entry.clone()) {
            let key = if entry.has_trace_id() {
                format!("trace_id={}", entry.trace_id)
            } else {
                format!("fingerprint={}", Fingerprint::of(&entry).key())
            };
            self.sink.log(
                Severity::Debug,
                COMPONENT_PIPELINE,
                &format!("聚合器丢弃重复条目: {}", key),
            );
        }

        entry
    }

    /// 加入一个观察者：注册 + 回放快照
    pub fn join_viewer(&self) -> Viewer {
        let viewer = self.broadcaster.join();
        self.sink.log(
            Severity::Info,
            COMPONENT_BROADCAST,
            &format!(
                "观察者 #{} 已加入，回放 {} 条 (当前观察者: {})",
                viewer.id,
                viewer.backlog.len(),
                self.broadcaster.viewer_count()
            ),
        );
        viewer
    }

    pub fn leave_viewer(&self, id: ViewerId) {
        if self.broadcaster.leave(id) {
            self.sink.log(
                Severity::Info,
                COMPONENT_BROADCAST,
                &format!(
                    "观察者 #{} 已离开 (剩余观察者: {})",
                    id,
                    self.broadcaster.viewer_count()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    fn collector_with_sink() -> (Collector, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let mut config = TraceConfig::default();
        config.storage.max_logs_per_service = 1000;
        (Collector::new(&config, sink.clone()), sink)
    }

    #[test]
    fn test_ingest_feeds_store_and_aggregator() {
        let (collector, _) = collector_with_sink();
        let raw = br#"{"Level":"ERROR","Message":"boom","Service":"auth"}"#;

        let entry = collector.ingest(raw, IngestChannel::Http).unwrap();
        assert_eq!(entry.service, "auth");

        let stored = collector.store().get_service("auth");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, "ERROR");
        assert_eq!(stored[0].message, "boom");
        assert!(stored[0].trace_id.is_empty());
        assert!(stored[0].session_id.is_empty());
        assert_eq!(collector.aggregator().get_logs("auth").len(), 1);
    }

    #[test]
    fn test_repeated_payload_is_stored_twice_but_aggregated_once() {
        let (collector, sink) = collector_with_sink();
        let raw = br#"{"Level":"ERROR","Message":"boom","Service":"auth"}"#;

        collector.ingest(raw, IngestChannel::Http).unwrap();
        collector.ingest(raw, IngestChannel::Http).unwrap();

        assert_eq!(collector.store().get_service("auth").len(), 2);
        assert_eq!(collector.aggregator().get_logs("auth").len(), 1);
        assert_eq!(sink.count(Severity::Debug, COMPONENT_PIPELINE), 1);

        let records = sink.records();
        let (_, _, message) = records
            .iter()
            .find(|(s, c, _)| *s == Severity::Debug && c == COMPONENT_PIPELINE)
            .unwrap();
        assert!(message.contains("fingerprint=auth|ERROR|boom"));
    }

    #[test]
    fn test_dropped_viewer_is_pruned_and_logged() {
        let (collector, sink) = collector_with_sink();
        let viewer = collector.join_viewer();
        drop(viewer);

        collector.ingest(br#"{"Message":"x"}"#, IngestChannel::Http).unwrap();

        assert_eq!(collector.broadcaster().viewer_count(), 0);
        assert_eq!(sink.count(Severity::Debug, COMPONENT_BROADCAST), 1);
    }

    #[test]
    fn test_channel_default_service() {
        let (collector, _) = collector_with_sink();
        collector.ingest(br#"{"Message":"from http"}"#, IngestChannel::Http).unwrap();
        collector.ingest(br#"{"Message":"from ws"}"#, IngestChannel::WebSocket).unwrap();

        assert_eq!(collector.store().get_service("HTTP").len(), 1);
        assert_eq!(collector.store().get_service("WS").len(), 1);
    }

    #[test]
    fn test_malformed_payload_touches_nothing() {
        let (collector, _) = collector_with_sink();
        let mut viewer = collector.join_viewer();

        assert!(collector.ingest(b"not json", IngestChannel::Http).is_err());

        assert!(collector.store().is_empty());
        assert!(collector.aggregator().is_empty());
        assert!(viewer.receiver.try_recv().is_err());
    }

    #[test]
    fn test_viewer_join_and_leave_are_logged() {
        let (collector, sink) = collector_with_sink();
        let viewer = collector.join_viewer();
        collector.leave_viewer(viewer.id);
        collector.leave_viewer(viewer.id);

        assert_eq!(sink.count(Severity::Info, COMPONENT_BROADCAST), 2);
        assert_eq!(collector.broadcaster().viewer_count(), 0);
    }
}
