//! 内存保留存储
//!
//! 按服务保存最近的日志条目，每个服务最多保留 `max_per_service` 条，
//! 超出部分按先进先出淘汰。所有读取返回独立快照，调用方无需持锁遍历。

use crate::models::LogEntry;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

pub type ServiceLogs = HashMap<String, Vec<Arc<LogEntry>>>;

/// 按服务分组的有界日志存储
#[derive(Debug)]
pub struct MemoryStore {
    // BTreeMap保证回放时服务顺序稳定
    logs: RwLock<BTreeMap<String, VecDeque<Arc<LogEntry>>>>,
    max_per_service: usize,
}

impl MemoryStore {
    /// 创建存储，容量至少为1
    pub fn new(max_per_service: usize) -> Self {
        Self {
            logs: RwLock::new(BTreeMap::new()),
            max_per_service: max_per_service.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_per_service
    }

    /// 追加条目，超出容量时淘汰该服务最旧的条目
    pub fn put(&self, entry: Arc<LogEntry>) {
        let mut logs = self.logs.write().unwrap_or_else(|e| e.into_inner());
        let service_logs = logs.entry(entry.service_key().to_string()).or_default();
        service_logs.push_back(entry);

        while service_logs.len() > self.max_per_service {
            service_logs.pop_front();
        }
    }

    /// 获取所有服务日志的一致快照
    pub fn get_all(&self) -> ServiceLogs {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.iter()
            .map(|(service, entries)| (service.clone(), entries.iter().cloned().collect()))
            .collect()
    }

    /// 获取单个服务的日志快照，未知服务返回空列表
    pub fn get_service(&self, service: &str) -> Vec<Arc<LogEntry>> {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.get(service)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 清空单个服务的日志
    pub fn clear_service(&self, service: &str) {
        let mut logs = self.logs.write().unwrap_or_else(|e| e.into_inner());
        logs.insert(service.to_string(), VecDeque::new());
    }

    /// 按回放顺序展开的快照：服务按名称排序，服务内从最旧到最新
    pub fn replay_order(&self) -> Vec<Arc<LogEntry>> {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.values().flat_map(|entries| entries.iter().cloned()).collect()
    }

    pub fn service_names(&self) -> Vec<String> {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.keys().cloned().collect()
    }

    /// 当前保留的条目总数
    pub fn len(&self) -> usize {
        let logs = self.logs.read().unwrap_or_else(|e| e.into_inner());
        logs.values().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(service: &str, message: &str) -> Arc<LogEntry> {
        Arc::new(LogEntry {
            timestamp: Utc::now(),
            level: "INFO".to_string(),
            message: message.to_string(),
            service: service.to_string(),
            trace_id: String::new(),
            session_id: String::new(),
            metadata: HashMap::new(),
        })
    }

    #[test]
    fn test_put_and_get_service() {
        let store = MemoryStore::new(10);
        store.put(entry("auth", "a1"));
        store.put(entry("auth", "a2"));
        store.put(entry("billing", "b1"));

        let auth = store.get_service("auth");
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[0].message, "a1");
        assert_eq!(auth[1].message, "a2");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_unknown_service_is_empty() {
        let store = MemoryStore::new(10);
        assert!(store.get_service("nope").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_eviction_keeps_most_recent_window() {
        let store = MemoryStore::new(1000);
        for i in 1..=1001 {
            store.put(entry("x", &format!("entry #{}", i)));
        }

        let logs = store.get_service("x");
        assert_eq!(logs.len(), 1000);
        assert_eq!(logs[0].message, "entry #2");
        assert_eq!(logs[999].message, "entry #1001");
        assert!(logs.iter().all(|e| e.message != "entry #1"));
    }

    #[test]
    fn test_eviction_is_per_service() {
        let store = MemoryStore::new(3);
        for i in 0..5 {
            store.put(entry("busy", &i.to_string()));
        }
        store.put(entry("quiet", "only"));

        let busy: Vec<String> = store
            .get_service("busy")
            .iter()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(busy, vec!["2", "3", "4"]);
        assert_eq!(store.get_service("quiet").len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let store = MemoryStore::new(10);
        store.put(entry("auth", "before"));

        let snapshot = store.get_all();
        store.put(entry("auth", "after"));
        store.clear_service("auth");

        assert_eq!(snapshot["auth"].len(), 1);
        assert_eq!(snapshot["auth"][0].message, "before");
        assert!(store.get_service("auth").is_empty());
    }

    #[test]
    fn test_empty_service_is_stored_as_unknown() {
        let store = MemoryStore::new(10);
        store.put(entry("", "orphan"));
        assert_eq!(store.get_service("UNKNOWN").len(), 1);
    }

    #[test]
    fn test_replay_order_is_oldest_first_per_service() {
        let store = MemoryStore::new(10);
        store.put(entry("zeta", "z1"));
        store.put(entry("alpha", "a1"));
        store.put(entry("zeta", "z2"));

        let order: Vec<String> = store.replay_order().iter().map(|e| e.message.clone()).collect();
        assert_eq!(order, vec!["a1", "z1", "z2"]);
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let store = Arc::new(MemoryStore::new(50));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.put(entry("shared", &format!("{}-{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_service("shared").len(), 50);
    }
}
