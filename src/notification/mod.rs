//! 通知层 - 短暂显示、自动过期的 toast 消息
//!
//! # 使用示例
//! ```ignore
//! use re2no_client::notification::ToastManager;
//!
//! let toasts = ToastManager::new();
//! let id = toasts.success("Saved!", None);
//! toasts.remove(id);
//! ```

pub mod kind;
pub mod manager;
pub mod timer;

pub use kind::ToastKind;
pub use manager::{Toast, ToastManager, DEFAULT_TOAST_DURATION};
pub use timer::ExpiryTimer;
