//! 实时广播模块
//!
//! 每个观察者拥有独立的有界投递队列，广播只做非阻塞入队，
//! 真正的socket写入由各连接任务自己完成，慢观察者不会拖住其他观察者和采集路径。
//!
//! 加入与发布共用观察者集合这一把锁：
//! - 发布：写入保留存储 + 入队到所有观察者
//! - 加入：读取保留存储快照 + 注册观察者
//! 因此任意条目对新观察者要么出现在回放快照中，要么出现在实时队列中，恰好一次。

use crate::models::LogEntry;
use crate::storage::MemoryStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub type ViewerId = u64;

/// 新加入的观察者：回放快照 + 实时接收端
#[derive(Debug)]
pub struct Viewer {
    pub id: ViewerId,
    pub backlog: Vec<Arc<LogEntry>>,
    pub receiver: mpsc::Receiver<Arc<LogEntry>>,
}

/// 一次广播的投递结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    /// 队列已满的观察者，已被移除
    pub lagging: Vec<ViewerId>,
    /// 接收端已关闭的观察者，已被移除
    pub closed: Vec<ViewerId>,
}

pub struct Broadcaster {
    store: Arc<MemoryStore>,
    viewers: Mutex<HashMap<ViewerId, mpsc::Sender<Arc<LogEntry>>>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl Broadcaster {
    pub fn new(store: Arc<MemoryStore>, queue_capacity: usize) -> Self {
        Self {
            store,
            viewers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// 注册观察者并原子地获取回放快照
    pub fn join(&self) -> Viewer {
        let mut viewers = self.viewers.lock().unwrap_or_else(|e| e.into_inner());
        let backlog = self.store.replay_order();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        viewers.insert(id, tx);

        Viewer {
            id,
            backlog,
            receiver: rx,
        }
    }

    /// 注销观察者，重复注销无副作用
    pub fn leave(&self, id: ViewerId) -> bool {
        let mut viewers = self.viewers.lock().unwrap_or_else(|e| e.into_inner());
        viewers.remove(&id).is_some()
    }

    /// 写入保留存储并广播给所有观察者
    pub fn publish(&self, entry: Arc<LogEntry>) -> FanOutReport {
        let mut viewers = self.viewers.lock().unwrap_or_else(|e| e.into_inner());
        self.store.put(entry.clone());
        Self::fan_out(&mut viewers, &entry)
    }

    /// 只广播，不写入保留存储
    pub fn broadcast(&self, entry: Arc<LogEntry>) -> FanOutReport {
        let mut viewers = self.viewers.lock().unwrap_or_else(|e| e.into_inner());
        Self::fan_out(&mut viewers, &entry)
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn fan_out(
        viewers: &mut HashMap<ViewerId, mpsc::Sender<Arc<LogEntry>>>,
        entry: &Arc<LogEntry>,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();

        // 队列满的观察者直接移除，其连接随后关闭，不会出现静默缺口
        viewers.retain(|id, tx| match tx.try_send(entry.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.lagging.push(*id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                report.closed.push(*id);
                false
            }
        });

        report
    }
}
