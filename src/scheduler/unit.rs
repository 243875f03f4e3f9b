//! 翻译单元
//!
//! 单元是调度的最小粒度：一个分句加上它所属请求分组、优先级、结果与完成信号。
//! 结果只会被写入一次，写入之后才会触发完成信号，因此任何观察到完成的等待者
//! 都能看到完整的终态。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use tokio::sync::watch;

use crate::error::GatewayError;

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// 单元唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// 可调度的翻译单元
///
/// 通常以 `Arc<Unit>` 的形式在请求编排器、队列与批次之间传递。
pub struct Unit {
    id: UnitId,
    text: String,
    /// 原始输入文本的序号
    group: usize,
    /// 数值越小越先被调度
    priority: i32,
    outcome: OnceLock<Result<String, GatewayError>>,
    done: watch::Sender<bool>,
}

impl Unit {
    /// 创建新的翻译单元
    pub fn new(text: impl Into<String>, group: usize, priority: i32) -> Self {
        let (done, _) = watch::channel(false);

        Self {
            id: UnitId::next(),
            text: text.into(),
            group,
            priority,
            outcome: OnceLock::new(),
            done,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// 翻译结果（仅在成功完成后存在）
    pub fn translation(&self) -> Option<&str> {
        match self.outcome.get() {
            Some(Ok(translation)) => Some(translation),
            _ => None,
        }
    }

    /// 批次失败时写入的错误
    pub fn error(&self) -> Option<&GatewayError> {
        match self.outcome.get() {
            Some(Err(error)) => Some(error),
            _ => None,
        }
    }

    /// 完成信号是否已触发
    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    /// 写入终态并触发完成信号
    ///
    /// 只有第一次调用生效，返回是否由本次调用完成了该单元。
    pub(crate) fn complete(&self, outcome: Result<String, GatewayError>) -> bool {
        if self.outcome.set(outcome).is_err() {
            tracing::warn!("单元 {} 重复完成，忽略后续结果", self.id);
            return false;
        }

        self.done.send_replace(true);
        true
    }

    /// 等待单元完成，可被任意多个等待者同时调用
    pub async fn wait(&self) {
        let mut done = self.done.subscribe();
        // 发送端由单元自身持有，等待期间不会被释放
        let _ = done.wait_for(|done| *done).await;
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("group", &self.group)
            .field("priority", &self.priority)
            .field("done", &self.is_done())
            .finish()
    }
}
