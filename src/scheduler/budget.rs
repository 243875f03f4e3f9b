//! 并发预算跟踪
//!
//! 经由投喂循环预留时 `processing_batches` 始终满足
//! `0 ≤ processing_batches ≤ max_concurrent_batches`。
//! 读取可用容量与随后的预留必须在同一次加锁中完成。

/// 并发预算
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    max_concurrent_batches: usize,
    max_segments_per_batch: usize,
    processing_batches: usize,
}

impl BudgetTracker {
    pub fn new(max_concurrent_batches: usize, max_segments_per_batch: usize) -> Self {
        Self {
            max_concurrent_batches,
            max_segments_per_batch,
            processing_batches: 0,
        }
    }

    /// 当前还能放入新批次的最大单元数
    pub fn available_capacity(&self) -> usize {
        self.available_batches()
            .saturating_mul(self.max_segments_per_batch)
    }

    /// 当前还能启动的批次数
    pub fn available_batches(&self) -> usize {
        self.max_concurrent_batches
            .saturating_sub(self.processing_batches)
    }

    /// 为新形成的批次预留预算
    ///
    /// 调用方按 `available_capacity()` 取单元并按批次上限切分，
    /// 因此批次数不会超过 `available_batches()`。超出时如实计数并记录错误，
    /// 保证之后的每次 `release` 都与一个真实批次对应。
    pub fn reserve(&mut self, batches: usize) {
        let available = self.available_batches();
        if batches > available {
            tracing::error!(
                "预留 {} 个批次超出可用预算 {}（上限 {}）",
                batches,
                available,
                self.max_concurrent_batches
            );
        }
        self.processing_batches += batches;
    }

    /// 批次完成后释放一个预算槽位
    pub fn release(&mut self) {
        if self.processing_batches == 0 {
            tracing::error!("释放预算时处理中批次数已为0");
            return;
        }
        self.processing_batches -= 1;
    }

    pub fn processing_batches(&self) -> usize {
        self.processing_batches
    }

    pub fn max_segments_per_batch(&self) -> usize {
        self.max_segments_per_batch
    }
}
