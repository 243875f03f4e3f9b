//! 调度统计
//!
//! 使用原子计数器收集，避免在热路径上加锁；同时镜像到 `metrics` 门面。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// 调度器运行统计（线程安全）
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// 进入队列的单元总数
    pub units_enqueued: AtomicU64,
    /// 因请求取消而被撤回的单元数
    pub units_withdrawn: AtomicU64,
    /// 已派发的批次数
    pub batches_dispatched: AtomicU64,
    /// 引擎失败的批次数
    pub batches_failed: AtomicU64,
    /// 成功翻译的单元数
    pub units_translated: AtomicU64,
    /// 引擎调用累计耗时（微秒）
    pub engine_time_micros: AtomicU64,
}

impl SchedulerStats {
    pub fn add_enqueued(&self, count: usize) {
        self.units_enqueued.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!("gateway_units_enqueued_total").increment(count as u64);
    }

    pub fn add_withdrawn(&self, count: usize) {
        self.units_withdrawn.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!("gateway_units_withdrawn_total").increment(count as u64);
    }

    pub fn inc_dispatched(&self) {
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("gateway_batches_dispatched_total").increment(1);
    }

    pub fn inc_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("gateway_batches_failed_total").increment(1);
    }

    pub fn add_translated(&self, count: usize) {
        self.units_translated.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!("gateway_units_translated_total").increment(count as u64);
    }

    pub fn add_engine_time(&self, duration: Duration) {
        self.engine_time_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        metrics::histogram!("gateway_engine_seconds").record(duration.as_secs_f64());
    }

    /// 生成统计快照
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            units_enqueued: self.units_enqueued.load(Ordering::Relaxed),
            units_withdrawn: self.units_withdrawn.load(Ordering::Relaxed),
            batches_dispatched: self.batches_dispatched.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            units_translated: self.units_translated.load(Ordering::Relaxed),
            engine_time_micros: self.engine_time_micros.load(Ordering::Relaxed),
        }
    }
}

/// 统计快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub units_enqueued: u64,
    pub units_withdrawn: u64,
    pub batches_dispatched: u64,
    pub batches_failed: u64,
    pub units_translated: u64,
    pub engine_time_micros: u64,
}

impl StatsSnapshot {
    /// 平均每批引擎耗时（毫秒）
    pub fn average_engine_millis(&self) -> f64 {
        if self.batches_dispatched == 0 {
            0.0
        } else {
            self.engine_time_micros as f64 / 1000.0 / self.batches_dispatched as f64
        }
    }
}
