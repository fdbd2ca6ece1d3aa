//! 批量去重工具
//!
//! 对一批快照条目做一次性去重，不修改聚合器状态，用于查询接口。

use super::Fingerprint;
use crate::models::LogEntry;
use std::collections::HashSet;
use std::sync::Arc;

/// 按追踪ID去重：无追踪ID的条目全部保留，同一追踪ID只保留第一条
pub fn dedup_by_trace_id(entries: &[Arc<LogEntry>]) -> Vec<Arc<LogEntry>> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| !entry.has_trace_id() || seen.insert(entry.trace_id.as_str()))
        .cloned()
        .collect()
}

/// 按 (service, level, message) 指纹去重，保留每个指纹的第一条
pub fn dedup_by_fingerprint(entries: &[Arc<LogEntry>]) -> Vec<Arc<LogEntry>> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| seen.insert(Fingerprint::of(entry)))
        .cloned()
        .collect()
}
