//! 翻译调度核心
//!
//! 把来自任意多个请求的单元放进同一个优先级队列，由投喂循环在并发预算内
//! 合并成批次，交给派发器调用翻译引擎。
//!
//! 队列与预算计数共享同一把锁；锁内只做内存操作，从不跨越 `.await`。

pub mod budget;
pub mod dispatcher;
pub mod feeder;
pub mod queue;
pub mod stats;
pub mod unit;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::adapters::TranslationEngine;
use crate::config::EngineConfig;

pub use budget::BudgetTracker;
pub use dispatcher::{Batch, BatchDispatcher};
pub use feeder::BatchFeeder;
pub use queue::UnitQueue;
pub use stats::{SchedulerStats, StatsSnapshot};
pub use unit::{Unit, UnitId};

/// 锁保护的调度状态
#[derive(Debug)]
pub struct SchedulerState {
    pub queue: UnitQueue,
    pub budget: BudgetTracker,
}

impl SchedulerState {
    pub fn new(max_concurrent_batches: usize, max_segments_per_batch: usize) -> Self {
        Self {
            queue: UnitQueue::new(),
            budget: BudgetTracker::new(max_concurrent_batches, max_segments_per_batch),
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<SchedulerState>>;

/// 获取调度锁
///
/// 锁内操作不会中途失败，持锁线程 panic 后状态依然一致，因此直接沿用。
pub(crate) fn lock_state(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 调度参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub max_segments_per_batch: usize,
    pub max_concurrent_batches: usize,
    pub feed_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SchedulerConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_segments_per_batch: config.max_segments_per_batch.max(1),
            max_concurrent_batches: config.max_concurrent_batches.max(1),
            feed_interval: config.feed_interval(),
        }
    }
}

/// 调度器句柄，可廉价克隆并在请求之间共享
#[derive(Clone)]
pub struct Scheduler {
    state: SharedState,
    feeder: BatchFeeder,
    stats: Arc<SchedulerStats>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, engine: Arc<dyn TranslationEngine>) -> Self {
        let state = Arc::new(Mutex::new(SchedulerState::new(
            config.max_concurrent_batches.max(1),
            config.max_segments_per_batch.max(1),
        )));
        let stats = Arc::new(SchedulerStats::default());
        let dispatcher = BatchDispatcher::new(Arc::clone(&state), engine, Arc::clone(&stats));
        let feeder = BatchFeeder::new(Arc::clone(&state), dispatcher, config.feed_interval);

        Self {
            state,
            feeder,
            stats,
            config,
        }
    }

    /// 在一次加锁中把请求的全部单元放入队列
    pub fn enqueue(&self, units: &[Arc<Unit>]) {
        if units.is_empty() {
            return;
        }

        let queued = {
            let mut state = lock_state(&self.state);
            for unit in units {
                state.queue.add(Arc::clone(unit));
            }
            state.queue.len()
        };

        self.stats.add_enqueued(units.len());
        metrics::gauge!("gateway_queued_units").set(queued as f64);
        tracing::debug!("入队 {} 个单元，队列长度 {}", units.len(), queued);
    }

    /// 撤回仍在队列中的单元，已被取走的单元不受影响
    ///
    /// 返回实际移除的单元数。
    pub fn withdraw(&self, units: &[Arc<Unit>]) -> usize {
        let (removed, queued) = {
            let mut state = lock_state(&self.state);
            let removed = units
                .iter()
                .filter(|unit| state.queue.remove(unit.id()).is_ok())
                .count();
            (removed, state.queue.len())
        };

        if removed > 0 {
            self.stats.add_withdrawn(removed);
            metrics::gauge!("gateway_queued_units").set(queued as f64);
        }
        removed
    }

    /// 执行一轮投喂，返回启动的派发任务
    pub fn feed_once(&self) -> Vec<JoinHandle<()>> {
        self.feeder.tick()
    }

    /// 在后台启动投喂循环
    pub fn start(&self) -> JoinHandle<()> {
        tokio::spawn(self.feeder.clone().run())
    }

    pub fn queued_units(&self) -> usize {
        lock_state(&self.state).queue.len()
    }

    pub fn processing_batches(&self) -> usize {
        lock_state(&self.state).budget.processing_batches()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeTranslationEngine;

    fn scheduler(max_concurrent: usize, per_batch: usize) -> Scheduler {
        Scheduler::new(
            SchedulerConfig {
                max_segments_per_batch: per_batch,
                max_concurrent_batches: max_concurrent,
                feed_interval: Duration::from_millis(5),
            },
            Arc::new(FakeTranslationEngine::new()),
        )
    }

    #[test]
    fn test_config_from_engine_config() {
        let engine = EngineConfig {
            max_segments_per_batch: 0,
            max_concurrent_batches: 7,
            feed_interval_ms: 250,
            ..EngineConfig::default()
        };
        let config = SchedulerConfig::from(&engine);
        assert_eq!(config.max_segments_per_batch, 1);
        assert_eq!(config.max_concurrent_batches, 7);
        assert_eq!(config.feed_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_enqueue_and_withdraw() {
        let scheduler = scheduler(2, 2);
        let units: Vec<_> = (0..3).map(|i| Arc::new(Unit::new(format!("{}", i), 0, 0))).collect();

        scheduler.enqueue(&units);
        assert_eq!(scheduler.queued_units(), 3);

        assert_eq!(scheduler.withdraw(&units[..1]), 1);
        assert_eq!(scheduler.withdraw(&units[..1]), 0);
        assert_eq!(scheduler.queued_units(), 2);

        let stats = scheduler.stats();
        assert_eq!(stats.units_enqueued, 3);
        assert_eq!(stats.units_withdrawn, 1);
    }

    #[tokio::test]
    async fn test_feed_once_completes_units() {
        let scheduler = scheduler(2, 2);
        let units: Vec<_> = ["x", "y", "z"]
            .iter()
            .map(|t| Arc::new(Unit::new(*t, 0, 0)))
            .collect();
        scheduler.enqueue(&units);

        for handle in scheduler.feed_once() {
            handle.await.unwrap();
        }

        assert_eq!(scheduler.processing_batches(), 0);
        assert_eq!(scheduler.queued_units(), 0);
        let translations: Vec<_> = units.iter().map(|u| u.translation().unwrap()).collect();
        assert_eq!(translations, ["x fake", "y fake", "z fake"]);
    }

    #[tokio::test]
    async fn test_background_feeder() {
        let scheduler = scheduler(1, 1);
        let unit = Arc::new(Unit::new("bg", 0, 0));
        scheduler.enqueue(&[Arc::clone(&unit)]);

        let feeder = scheduler.start();
        tokio::time::timeout(Duration::from_secs(5), unit.wait())
            .await
            .unwrap();
        feeder.abort();

        assert_eq!(unit.translation(), Some("bg fake"));
    }
}
