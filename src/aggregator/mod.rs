//! 日志聚合器模块
//!
//! 跨连接去重并按服务查询：
//! - 带 `TraceID` 的条目按追踪ID去重，首次出现的条目保留
//! - 不带 `TraceID` 的条目按 (service, level, message) 指纹去重
//! - 聚合器不做容量淘汰，生命周期与一次采集会话相同

pub mod dedup;

use crate::models::{LogEntry, UNKNOWN_SERVICE};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

pub use dedup::{dedup_by_fingerprint, dedup_by_trace_id};

/// 内容指纹，显式记录所属服务
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub service: String,
    pub level: String,
    pub message: String,
}

impl Fingerprint {
    pub fn of(entry: &LogEntry) -> Self {
        Self {
            service: entry.service_key().to_string(),
            level: entry.level.clone(),
            message: entry.message.clone(),
        }
    }

    /// `service|level|message` 形式的展示键
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.service, self.level, self.message)
    }
}

#[derive(Debug, Default)]
struct AggregatorState {
    logs: HashMap<String, Vec<Arc<LogEntry>>>,
    seen_trace_ids: HashSet<String>,
    seen_fingerprints: HashSet<Fingerprint>,
}

/// 去重聚合器
#[derive(Debug, Default)]
pub struct Aggregator {
    state: RwLock<AggregatorState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加日志条目，返回是否被接纳
    ///
    /// 重复条目被静默丢弃，不视为错误
    pub fn add_log(&self, entry: Arc<LogEntry>) -> bool {
        // 检查与插入必须在同一把写锁内完成
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        let entry = if entry.service.is_empty() {
            let mut normalized = (*entry).clone();
            normalized.service = UNKNOWN_SERVICE.to_string();
            Arc::new(normalized)
        } else {
            entry
        };

        if entry.has_trace_id() {
            if !state.seen_trace_ids.insert(entry.trace_id.clone()) {
                return false;
            }
        } else if !state.seen_fingerprints.insert(Fingerprint::of(&entry)) {
            return false;
        }

        state.logs.entry(entry.service.clone()).or_default().push(entry);
        true
    }

    /// 获取服务的全部日志，按到达顺序
    pub fn get_logs(&self, service: &str) -> Vec<Arc<LogEntry>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.logs.get(service).cloned().unwrap_or_default()
    }

    /// 获取已观察到的服务名，无序
    pub fn get_all_services(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.logs.keys().cloned().collect()
    }

    /// 清除单个服务的日志以及该服务拥有的全部指纹
    ///
    /// 追踪ID索引不按服务划分，保持不变
    pub fn clear_service_logs(&self, service: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.logs.remove(service);
        state.seen_fingerprints.retain(|fp| fp.service != service);
    }

    /// 重置全部日志和两个去重索引
    pub fn clear_all(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = AggregatorState::default();
    }

    /// 已接纳的条目总数
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.logs.values().map(|logs| logs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
