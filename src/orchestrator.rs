//! 翻译请求编排
//!
//! 一次请求的完整流程：分句、创建单元、整体入队、等待全部单元完成、
//! 按掩码把译文拼回原文结构。任一单元失败则整个请求失败，不返回部分结果。
//!
//! 请求 future 被丢弃（客户端断开、超时取消）时，仍在队列中的单元会被撤回；
//! 已进入批次的单元照常完成，结果被丢弃。

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::adapters::{mask, TextSegmenter};
use crate::error::{GatewayError, GatewayResult};
use crate::scheduler::{Scheduler, Unit};

/// 单段原文及其译文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub text: String,
    pub translation: String,
}

/// 请求编排器
#[derive(Clone)]
pub struct Orchestrator {
    scheduler: Scheduler,
    segmenter: Arc<dyn TextSegmenter>,
    default_priority: i32,
}

impl Orchestrator {
    pub fn new(
        scheduler: Scheduler,
        segmenter: Arc<dyn TextSegmenter>,
        default_priority: i32,
    ) -> Self {
        Self {
            scheduler,
            segmenter,
            default_priority,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn default_priority(&self) -> i32 {
        self.default_priority
    }

    /// 翻译一组原文，结果与输入等长且顺序一致
    pub async fn translate(
        &self,
        texts: Vec<String>,
        priority: Option<i32>,
    ) -> GatewayResult<Vec<TranslatedText>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let priority = priority.unwrap_or(self.default_priority);
        tracing::info!("开始翻译请求: {} 段原文，优先级 {}", texts.len(), priority);

        let segmented = self
            .segmenter
            .segment(&texts)
            .await
            .map_err(|e| e.with_context(format!("{} 段原文", texts.len())))?;
        if segmented.len() != texts.len() {
            return Err(GatewayError::Segmentation(format!(
                "分句结果数量 {} 与原文数量 {} 不一致",
                segmented.len(),
                texts.len()
            )));
        }

        let units: Vec<Arc<Unit>> = segmented
            .iter()
            .enumerate()
            .flat_map(|(group, result)| {
                result
                    .segments
                    .iter()
                    .map(move |segment| Arc::new(Unit::new(segment.clone(), group, priority)))
            })
            .collect();

        tracing::debug!(
            "请求包含 {} 段原文，{} 个分句，优先级 {}",
            texts.len(),
            units.len(),
            priority
        );

        if let Err(error) = self.await_units(&units).await {
            tracing::warn!("翻译请求失败: {}", error);
            return Err(error);
        }

        let grouped = group_translations(&units, texts.len())?;
        let translated = texts
            .into_iter()
            .zip(segmented.iter().zip(grouped.iter()))
            .map(|(text, (result, translations))| {
                let translation = mask::fill(&result.mask, translations)?;
                Ok(TranslatedText { text, translation })
            })
            .collect::<GatewayResult<Vec<_>>>()?;

        tracing::info!(
            "翻译请求完成: {} 个分句，耗时 {:?}",
            units.len(),
            started.elapsed()
        );
        Ok(translated)
    }

    /// 入队并等待全部单元完成
    ///
    /// 返回之前若 future 被丢弃，守卫会撤回尚未被取走的单元。
    async fn await_units(&self, units: &[Arc<Unit>]) -> GatewayResult<()> {
        if units.is_empty() {
            return Ok(());
        }

        self.scheduler.enqueue(units);
        let mut guard = WithdrawOnDrop::new(&self.scheduler, units);

        join_all(units.iter().map(|unit| unit.wait())).await;
        guard.disarm();

        match units.iter().find_map(|unit| unit.error()) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// 按原文序号收集译文，保持分句顺序
fn group_translations(units: &[Arc<Unit>], groups: usize) -> GatewayResult<Vec<Vec<&str>>> {
    let mut grouped: Vec<Vec<&str>> = vec![Vec::new(); groups];

    for unit in units {
        let translation = unit.translation().ok_or_else(|| {
            GatewayError::Internal(format!("单元 {} 已完成但没有译文", unit.id()))
        })?;
        grouped
            .get_mut(unit.group())
            .ok_or_else(|| GatewayError::Internal(format!("单元 {} 的分组越界", unit.id())))?
            .push(translation);
    }

    Ok(grouped)
}

/// 请求取消时撤回排队中的单元
struct WithdrawOnDrop<'a> {
    scheduler: &'a Scheduler,
    units: &'a [Arc<Unit>],
    armed: bool,
}

impl<'a> WithdrawOnDrop<'a> {
    fn new(scheduler: &'a Scheduler, units: &'a [Arc<Unit>]) -> Self {
        Self {
            scheduler,
            units,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for WithdrawOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let removed = self.scheduler.withdraw(self.units);
        tracing::info!(
            "请求已取消，撤回 {} 个排队单元（共 {} 个）",
            removed,
            self.units.len()
        );
    }
}
