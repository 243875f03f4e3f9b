//! 单元优先级队列
//!
//! 按 `(priority, 插入序号)` 全序出队：数值越小的优先级越先出队，
//! 同优先级按插入先后（FIFO）。支持按单元标识定向移除，移除不会
//! 打乱剩余单元的相对顺序。
//!
//! 队列本身不是线程安全的，所有操作都在调度器的共享锁内调用，
//! 因此这里不做任何 I/O，也不会等待。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};
use crate::scheduler::unit::{Unit, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    priority: i32,
    seq: u64,
}

/// 待处理单元的优先级队列
#[derive(Debug, Default)]
pub struct UnitQueue {
    entries: BTreeMap<QueueKey, Arc<Unit>>,
    index: HashMap<UnitId, QueueKey>,
    next_seq: u64,
}

impl UnitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入单元，O(log n)
    ///
    /// 已在队列中的单元不会被重复插入。
    pub fn add(&mut self, unit: Arc<Unit>) {
        if self.index.contains_key(&unit.id()) {
            tracing::debug!("单元 {} 已在队列中，跳过", unit.id());
            return;
        }

        let key = QueueKey {
            priority: unit.priority(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.index.insert(unit.id(), key);
        self.entries.insert(key, unit);
    }

    /// 取出优先级最高、最早插入的单元
    pub fn pop(&mut self) -> GatewayResult<Arc<Unit>> {
        let (_, unit) = self.entries.pop_first().ok_or(GatewayError::EmptyQueue)?;
        self.index.remove(&unit.id());
        Ok(unit)
    }

    /// 移除仍在队列中的指定单元
    ///
    /// 单元已被投喂循环取走时返回 `NotFound`，调用方可以忽略。
    pub fn remove(&mut self, id: UnitId) -> GatewayResult<Arc<Unit>> {
        let key = self
            .index
            .remove(&id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;

        self.entries
            .remove(&key)
            .ok_or_else(|| GatewayError::Internal(format!("队列索引与条目不一致: {}", id)))
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
