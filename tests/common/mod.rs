// 集成测试公共模块
//
// 提供可观察的假引擎、假分句服务与常用构造函数

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use translation_gateway::adapters::{SegmentedText, TextSegmenter, TranslationEngine};
use translation_gateway::scheduler::{Scheduler, SchedulerConfig};
use translation_gateway::{GatewayError, GatewayResult, Orchestrator};

/// 含有该标记的批次会被引擎拒绝
pub const FAIL_MARKER: &str = "FAIL";

fn fake_translate(texts: &[String]) -> Vec<String> {
    texts.iter().map(|text| format!("{} fake", text)).collect()
}

/// 记录每次调用批次的假引擎
#[derive(Default)]
pub struct RecordingEngine {
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// 按调用顺序展开的全部分句
    pub fn translated_segments(&self) -> Vec<String> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl TranslationEngine for RecordingEngine {
    async fn translate(&self, texts: Vec<String>) -> GatewayResult<Vec<String>> {
        self.batches.lock().unwrap().push(texts.clone());

        if texts.iter().any(|text| text.contains(FAIL_MARKER)) {
            return Err(GatewayError::EngineBatch("engine rejected batch".to_string()));
        }
        Ok(fake_translate(&texts))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 阻塞在闸门上的假引擎，用于观察处理中批次
pub struct GatedEngine {
    gate: Semaphore,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl GatedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        })
    }

    /// 放行 n 个批次
    pub fn open(&self, batches: usize) {
        self.gate.add_permits(batches);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl TranslationEngine for GatedEngine {
    async fn translate(&self, texts: Vec<String>) -> GatewayResult<Vec<String>> {
        self.batches.lock().unwrap().push(texts.clone());
        self.started.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| GatewayError::EngineBatch(e.to_string()))?;
        permit.forget();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(fake_translate(&texts))
    }
}

/// 按 ". " 切句的假分句服务
#[derive(Debug, Default, Clone)]
pub struct SentenceSegmenter;

impl SentenceSegmenter {
    pub fn split(text: &str) -> SegmentedText {
        if text.trim().is_empty() {
            return SegmentedText::new(Vec::new(), text);
        }

        let parts: Vec<&str> = text.split(". ").collect();
        let last = parts.len() - 1;
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i < last {
                    format!("{}.", part)
                } else {
                    part.to_string()
                }
            })
            .collect();

        SegmentedText::new(segments, vec!["{}"; parts.len()].join(" "))
    }
}

#[async_trait]
impl TextSegmenter for SentenceSegmenter {
    async fn segment(&self, texts: &[String]) -> GatewayResult<Vec<SegmentedText>> {
        Ok(texts.iter().map(|text| Self::split(text)).collect())
    }
}

/// 总是失败的分句服务
pub struct FailingSegmenter;

#[async_trait]
impl TextSegmenter for FailingSegmenter {
    async fn segment(&self, _texts: &[String]) -> GatewayResult<Vec<SegmentedText>> {
        Err(GatewayError::Segmentation("segmenter unreachable".to_string()))
    }
}

/// 少返回一条结果的分句服务
pub struct TruncatingSegmenter;

#[async_trait]
impl TextSegmenter for TruncatingSegmenter {
    async fn segment(&self, texts: &[String]) -> GatewayResult<Vec<SegmentedText>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|text| SentenceSegmenter::split(text))
            .collect())
    }
}

pub fn scheduler_config(max_concurrent_batches: usize, max_segments_per_batch: usize) -> SchedulerConfig {
    SchedulerConfig {
        max_segments_per_batch,
        max_concurrent_batches,
        feed_interval: Duration::from_millis(10),
    }
}

pub fn orchestrator(
    engine: Arc<dyn TranslationEngine>,
    max_concurrent_batches: usize,
    max_segments_per_batch: usize,
) -> Orchestrator {
    let scheduler = Scheduler::new(
        scheduler_config(max_concurrent_batches, max_segments_per_batch),
        engine,
    );
    Orchestrator::new(scheduler, Arc::new(SentenceSegmenter), 0)
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// 轮询直到条件成立或超时
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..2000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}
