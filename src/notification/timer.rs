//! Toast 过期定时器
//!
//! 每个 toast 在创建时调度一个过期任务。句柄由 `ToastManager` 保存，
//! 手动移除时可以提前取消，定时器自身触发时则只是被丢弃。

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// 已调度的过期动作
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// 在当前 Tokio 运行时上调度，`delay` 之后执行 `on_expire`
    ///
    /// 不在运行时上下文中调用时返回 `None`，调用方决定如何降级。
    pub fn schedule<F>(delay: Duration, on_expire: F) -> Option<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().ok()?;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_expire();
        });
        Some(Self { handle })
    }

    /// 取消尚未触发的过期动作
    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }

    /// 过期任务是否已经结束（触发或被取消）
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
