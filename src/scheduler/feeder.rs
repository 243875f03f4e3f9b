//! 批次投喂循环
//!
//! 每轮在共享锁内：读取可用容量、从队列取出单元、按批次上限切分、预留预算。
//! 然后在锁外为每个批次启动派发任务，最后休眠固定间隔。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::scheduler::dispatcher::{Batch, BatchDispatcher};
use crate::scheduler::{lock_state, SharedState};

/// 批次投喂器
#[derive(Clone)]
pub struct BatchFeeder {
    state: SharedState,
    dispatcher: BatchDispatcher,
    interval: Duration,
    next_batch_id: Arc<AtomicU64>,
}

impl BatchFeeder {
    pub(crate) fn new(state: SharedState, dispatcher: BatchDispatcher, interval: Duration) -> Self {
        Self {
            state,
            dispatcher,
            interval,
            next_batch_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// 在一次加锁中取出单元并形成批次，同时预留预算
    pub fn form_batches(&self) -> Vec<Batch> {
        let mut state = lock_state(&self.state);

        let capacity = state.budget.available_capacity();
        if capacity == 0 || state.queue.is_empty() {
            return Vec::new();
        }

        let mut admitted = Vec::with_capacity(capacity.min(state.queue.len()));
        while admitted.len() < capacity {
            match state.queue.pop() {
                Ok(unit) => admitted.push(unit),
                Err(_) => break,
            }
        }

        let per_batch = state.budget.max_segments_per_batch();
        let batches: Vec<Batch> = admitted
            .chunks(per_batch)
            .map(|units| Batch {
                id: self.next_batch_id.fetch_add(1, Ordering::Relaxed),
                units: units.to_vec(),
            })
            .collect();

        state.budget.reserve(batches.len());
        let processing = state.budget.processing_batches();
        drop(state);

        metrics::gauge!("gateway_processing_batches").set(processing as f64);
        tracing::debug!(
            "形成 {} 个批次，共 {} 个单元，处理中批次 {}",
            batches.len(),
            admitted.len(),
            processing
        );

        batches
    }

    /// 执行一轮投喂，返回本轮启动的派发任务
    pub fn tick(&self) -> Vec<JoinHandle<()>> {
        self.form_batches()
            .into_iter()
            .map(|batch| self.dispatcher.spawn(batch))
            .collect()
    }

    /// 持续运行投喂循环，直到所在任务被取消
    pub async fn run(self) {
        tracing::info!("批次投喂循环启动，间隔 {:?}", self.interval);

        loop {
            self.tick();
            tokio::time::sleep(self.interval).await;
        }
    }
}
