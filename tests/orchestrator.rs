//! 请求编排集成测试
//!
//! 测试分句、合批、重组、取消与失败传播的端到端行为

use std::sync::Arc;

use translation_gateway::scheduler::Scheduler;
use translation_gateway::{GatewayError, Orchestrator, TranslatedText};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{
    orchestrator, scheduler_config, texts, wait_until, FailingSegmenter, GatedEngine,
    RecordingEngine, SentenceSegmenter, TruncatingSegmenter, FAIL_MARKER,
};

fn translated(text: &str, translation: &str) -> TranslatedText {
    TranslatedText {
        text: text.to_string(),
        translation: translation.to_string(),
    }
}

/// 分句译文按掩码拼回原文结构
#[tokio::test]
async fn test_reassembly_matches_segmentation() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 4, 32);
    let feeder = orchestrator.scheduler().start();

    let result = orchestrator
        .translate(texts(&["A.", "B. C."]), None)
        .await
        .expect("translation should succeed");
    feeder.abort();

    assert_eq!(
        result,
        vec![
            translated("A.", "A. fake"),
            translated("B. C.", "B. fake C. fake"),
        ]
    );
    assert_eq!(engine.translated_segments(), ["A.", "B.", "C."]);
}

/// 没有分句的原文只由掩码生成译文
#[tokio::test]
async fn test_text_without_segments() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 2, 8);
    let feeder = orchestrator.scheduler().start();

    let result = orchestrator
        .translate(texts(&["", "X. Y.", "   "]), None)
        .await
        .unwrap();
    feeder.abort();

    assert_eq!(
        result,
        vec![
            translated("", ""),
            translated("X. Y.", "X. fake Y. fake"),
            translated("   ", "   "),
        ]
    );
}

/// 全部原文都没有分句时不会触达引擎
#[tokio::test]
async fn test_request_without_any_segment_skips_engine() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 2, 8);

    let result = orchestrator.translate(texts(&[""]), None).await.unwrap();

    assert_eq!(result, vec![translated("", "")]);
    assert_eq!(engine.calls(), 0);
    assert_eq!(orchestrator.scheduler().stats().units_enqueued, 0);
}

/// 同一批次中来自两个请求的单元一起失败
#[tokio::test]
async fn test_batch_failure_fails_every_owning_request() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 1, 10);
    let scheduler = orchestrator.scheduler().clone();

    let healthy = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&["Fine. Good."]), None).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 2).await);

    let doomed = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&[FAIL_MARKER]), None).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 3).await);

    let handles = scheduler.feed_once();
    assert_eq!(handles.len(), 1);
    for handle in handles {
        handle.await.unwrap();
    }

    let healthy = healthy.await.unwrap();
    let doomed = doomed.await.unwrap();
    assert!(matches!(healthy, Err(GatewayError::EngineBatch(_))));
    assert!(matches!(doomed, Err(GatewayError::EngineBatch(_))));
    assert_eq!(healthy.unwrap_err(), doomed.unwrap_err());

    assert_eq!(engine.calls(), 1);
    assert_eq!(scheduler.processing_batches(), 0);
}

/// 排队中的请求被取消后其单元不会发往引擎
#[tokio::test]
async fn test_cancelled_request_withdraws_queued_units() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 2, 4);
    let scheduler = orchestrator.scheduler().clone();

    let request = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&["One. Two."]), None).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 2).await);

    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    assert_eq!(scheduler.queued_units(), 0);
    assert!(scheduler.feed_once().is_empty());
    assert_eq!(engine.calls(), 0);
    assert_eq!(scheduler.stats().units_withdrawn, 2);
}

/// 已进入批次的单元在取消后照常完成并释放预算
#[tokio::test]
async fn test_cancellation_does_not_interrupt_running_batch() {
    let engine = GatedEngine::new();
    let orchestrator = orchestrator(engine.clone(), 1, 1);
    let scheduler = orchestrator.scheduler().clone();

    let request = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&["Sent. Queued."]), None).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 2).await);

    let handles = scheduler.feed_once();
    assert_eq!(handles.len(), 1);
    assert!(wait_until(|| engine.started() == 1).await);

    request.abort();
    let _ = request.await;

    // 只有尚未取走的单元被撤回
    assert_eq!(scheduler.queued_units(), 0);
    assert_eq!(scheduler.processing_batches(), 1);
    assert_eq!(scheduler.stats().units_withdrawn, 1);

    engine.open(1);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(scheduler.processing_batches(), 0);
    assert_eq!(engine.batch_sizes(), [1]);
}

/// 显式优先级先于默认优先级被调度
#[tokio::test]
async fn test_request_priority_orders_dispatch() {
    let engine = RecordingEngine::new();
    let scheduler = Scheduler::new(scheduler_config(1, 1), engine.clone());
    let orchestrator = Orchestrator::new(scheduler.clone(), Arc::new(SentenceSegmenter), 7);
    assert_eq!(orchestrator.default_priority(), 7);

    let background = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&["Background."]), None).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 1).await);

    let urgent = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.translate(texts(&["Urgent."]), Some(1)).await }
    });
    assert!(wait_until(|| scheduler.queued_units() == 2).await);

    for _ in 0..2 {
        for handle in scheduler.feed_once() {
            handle.await.unwrap();
        }
    }

    assert_eq!(engine.translated_segments(), ["Urgent.", "Background."]);
    assert_eq!(
        urgent.await.unwrap().unwrap(),
        vec![translated("Urgent.", "Urgent. fake")]
    );
    assert_eq!(
        background.await.unwrap().unwrap(),
        vec![translated("Background.", "Background. fake")]
    );
}

/// 分句失败时不会创建任何单元
#[tokio::test]
async fn test_segmentation_failure_aborts_request() {
    let engine = RecordingEngine::new();
    let scheduler = Scheduler::new(scheduler_config(1, 4), engine.clone());
    let orchestrator = Orchestrator::new(scheduler.clone(), Arc::new(FailingSegmenter), 0);

    let result = orchestrator.translate(texts(&["Hello."]), None).await;

    assert!(matches!(result, Err(GatewayError::Segmentation(_))));
    assert_eq!(scheduler.stats().units_enqueued, 0);
    assert_eq!(engine.calls(), 0);
}

/// 分句结果数量不一致视为分句失败
#[tokio::test]
async fn test_segment_count_mismatch_is_segmentation_error() {
    let engine = RecordingEngine::new();
    let scheduler = Scheduler::new(scheduler_config(1, 4), engine.clone());
    let orchestrator = Orchestrator::new(scheduler.clone(), Arc::new(TruncatingSegmenter), 0);

    let result = orchestrator.translate(texts(&["One.", "Two."]), None).await;

    assert!(matches!(result, Err(GatewayError::Segmentation(_))));
    assert_eq!(scheduler.queued_units(), 0);
}

/// 多个并发请求共享批次且各自得到正确结果
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_isolated() {
    let engine = RecordingEngine::new();
    let orchestrator = orchestrator(engine.clone(), 2, 5);
    let feeder = orchestrator.scheduler().start();

    let requests: Vec<_> = (0..8)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let input = format!("Req{i} first. Req{i} second.");
                let result = orchestrator.translate(vec![input.clone()], Some(i % 3)).await;
                (input, result)
            })
        })
        .collect();

    for request in requests {
        let (input, result) = request.await.unwrap();
        let result = result.expect("each request should succeed");
        let expected = input.replace("first.", "first. fake").replace("second.", "second. fake");
        assert_eq!(result, vec![translated(&input, &expected)]);
    }
    feeder.abort();

    assert!(engine.batches().iter().all(|batch| batch.len() <= 5));
    assert_eq!(engine.translated_segments().len(), 16);
}
