//! 批次派发
//!
//! 每个批次在独立任务中调用一次翻译引擎，把结果逐个写回单元，
//! 然后才触发完成信号，最后在共享锁内释放预算。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinHandle;

use crate::adapters::TranslationEngine;
use crate::error::{GatewayError, GatewayResult};
use crate::scheduler::stats::SchedulerStats;
use crate::scheduler::unit::Unit;
use crate::scheduler::{lock_state, SharedState};

/// 一次引擎调用处理的单元集合
#[derive(Debug)]
pub struct Batch {
    pub id: u64,
    pub units: Vec<Arc<Unit>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按单元顺序收集待翻译文本
    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.text().to_string()).collect()
    }
}

/// 批次派发器
#[derive(Clone)]
pub struct BatchDispatcher {
    state: SharedState,
    engine: Arc<dyn TranslationEngine>,
    stats: Arc<SchedulerStats>,
}

impl BatchDispatcher {
    pub(crate) fn new(
        state: SharedState,
        engine: Arc<dyn TranslationEngine>,
        stats: Arc<SchedulerStats>,
    ) -> Self {
        Self {
            state,
            engine,
            stats,
        }
    }

    /// 在后台任务中处理批次
    pub fn spawn(&self, batch: Batch) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run(batch).await })
    }

    /// 处理单个批次直到所有单元完成、预算释放
    pub async fn run(&self, batch: Batch) {
        self.stats.inc_dispatched();
        tracing::debug!("批次 {} 开始翻译，共 {} 个单元", batch.id, batch.len());

        let started = Instant::now();
        let outcome = self.call_engine(&batch).await;
        self.stats.add_engine_time(started.elapsed());

        match outcome {
            Ok(translations) => {
                for (unit, translation) in batch.units.iter().zip(translations) {
                    unit.complete(Ok(translation));
                }
                self.stats.add_translated(batch.len());
                tracing::debug!(
                    "批次 {} 翻译完成，耗时 {:?}",
                    batch.id,
                    started.elapsed()
                );
            }
            Err(error) => {
                self.stats.inc_failed();
                tracing::error!("批次 {} 翻译失败: {}", batch.id, error);
                for unit in &batch.units {
                    unit.complete(Err(error.clone()));
                }
            }
        }

        self.release();
    }

    async fn call_engine(&self, batch: &Batch) -> GatewayResult<Vec<String>> {
        let call = self.engine.translate(batch.texts());

        let translations = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(translations)) => translations,
            Ok(Err(GatewayError::EngineBatch(message))) => {
                return Err(GatewayError::EngineBatch(message))
            }
            Ok(Err(other)) => return Err(GatewayError::EngineBatch(other.to_string())),
            Err(_) => {
                return Err(GatewayError::EngineBatch(
                    "翻译引擎调用发生panic".to_string(),
                ))
            }
        };

        if translations.len() != batch.len() {
            return Err(GatewayError::EngineBatch(format!(
                "引擎返回 {} 条译文，期望 {} 条",
                translations.len(),
                batch.len()
            )));
        }

        Ok(translations)
    }

    fn release(&self) {
        let processing = {
            let mut state = lock_state(&self.state);
            state.budget.release();
            state.budget.processing_batches()
        };
        metrics::gauge!("gateway_processing_batches").set(processing as f64);
    }
}
