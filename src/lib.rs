//! re2no client - 拉取 Reddit 帖子并保存到 Notion

pub mod api;
pub mod cli;
pub mod config;
pub mod notification;

pub use api::{
    ApiClient, ApiError, AuthMode, CredentialStrategy, DateRange, FilterCriteria, NotionDatabase,
    PostView, RemotePost, SavePostRequest, SavePostResponse, SortMode, TokenStore, User,
};
pub use config::ClientConfig;
pub use notification::{Toast, ToastKind, ToastManager};
