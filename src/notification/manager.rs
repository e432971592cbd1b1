//! Toast 管理器 - 有序、自动过期的通知集合
//!
//! 每个 `ToastManager` 实例拥有独立的集合和 id 计数器（从 1 开始），
//! 不存在全局状态。克隆出的句柄共享同一个集合。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::kind::ToastKind;
use super::timer::ExpiryTimer;

/// 默认显示时长
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// 一条 toast 通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// 实例内唯一、递增的 id
    pub id: u64,
    /// 显示文本
    pub message: String,
    /// 类型
    pub kind: ToastKind,
}

#[derive(Debug)]
struct ToastState {
    /// 追加顺序即显示顺序
    toasts: Vec<Toast>,
    timers: HashMap<u64, ExpiryTimer>,
    next_id: u64,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<ToastState>,
    changes: watch::Sender<Vec<Toast>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ToastState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 从集合中删除 toast，返回对应的定时器（如果还在）
    fn take(&self, id: u64) -> Option<Option<ExpiryTimer>> {
        let mut state = self.lock();
        let index = state.toasts.iter().position(|t| t.id == id)?;
        state.toasts.remove(index);
        let timer = state.timers.remove(&id);
        self.changes.send_replace(state.toasts.clone());
        Some(timer)
    }

    /// 定时器触发路径：删除 toast，丢弃自身句柄
    fn expire(&self, id: u64) {
        if self.take(id).is_some() {
            debug!(toast_id = id, "Toast expired");
        }
    }
}

/// Toast 管理器
#[derive(Debug, Clone)]
pub struct ToastManager {
    inner: Arc<Inner>,
}

impl ToastManager {
    /// 创建空的管理器，id 从 1 开始
    pub fn new() -> Self {
        let (changes, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ToastState {
                    toasts: Vec::new(),
                    timers: HashMap::new(),
                    next_id: 1,
                }),
                changes,
            }),
        }
    }

    /// 添加 toast 并在 `duration` 后自动移除
    ///
    /// 立即返回 id，不等待过期。在 Tokio 运行时之外调用时 toast 仍会被添加，
    /// 但不会自动过期，只能通过 `remove` 删除。
    pub fn add(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> u64 {
        let mut state = self.inner.lock();

        let id = state.next_id;
        state.next_id += 1;
        state.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
        });

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let timer = ExpiryTimer::schedule(duration, move || {
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });

        match timer {
            Some(timer) => {
                state.timers.insert(id, timer);
            }
            None => {
                warn!(toast_id = id, "No Tokio runtime, toast will not expire automatically");
            }
        }

        debug!(
            toast_id = id,
            kind = %kind,
            duration_ms = duration.as_millis() as u64,
            "Toast added"
        );

        self.inner.changes.send_replace(state.toasts.clone());
        id
    }

    /// 使用默认类型（info）和默认时长添加
    pub fn push(&self, message: impl Into<String>) -> u64 {
        self.add(message, ToastKind::default(), DEFAULT_TOAST_DURATION)
    }

    /// 按 id 移除 toast，不存在时什么也不做
    ///
    /// 可以对同一 id 重复调用：过期定时器和手动关闭可能先后到达。
    pub fn remove(&self, id: u64) {
        if let Some(timer) = self.inner.take(id) {
            if let Some(timer) = timer {
                timer.cancel();
            }
            debug!(toast_id = id, "Toast removed");
        }
    }

    pub fn success(&self, message: impl Into<String>, duration: Option<Duration>) -> u64 {
        self.add(message, ToastKind::Success, duration.unwrap_or(DEFAULT_TOAST_DURATION))
    }

    pub fn error(&self, message: impl Into<String>, duration: Option<Duration>) -> u64 {
        self.add(message, ToastKind::Error, duration.unwrap_or(DEFAULT_TOAST_DURATION))
    }

    pub fn info(&self, message: impl Into<String>, duration: Option<Duration>) -> u64 {
        self.add(message, ToastKind::Info, duration.unwrap_or(DEFAULT_TOAST_DURATION))
    }

    /// 移除全部 toast 并取消所有定时器
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.toasts.clear();
        for (_, timer) in state.timers.drain() {
            timer.cancel();
        }
        self.inner.changes.send_replace(Vec::new());
    }

    /// 当前集合的快照（按显示顺序）
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.lock().toasts.clone()
    }

    pub fn get(&self, id: u64) -> Option<Toast> {
        self.inner.lock().toasts.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 订阅集合变化，每次增删都会推送新的快照
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.changes.subscribe()
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}
