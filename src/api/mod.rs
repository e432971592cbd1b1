//! Remote Access Layer - re2no 后端 API 的类型化封装

pub mod client;
pub mod credentials;
pub mod error;
pub mod token_store;
pub mod types;

pub use client::ApiClient;
pub use credentials::{strategy_for, AuthMode, BearerToken, CredentialStrategy, SessionCookie};
pub use error::ApiError;
pub use token_store::TokenStore;
pub use types::{
    mark_saved, normalize_subreddit, only_unsaved, CreatedDatabase, DateRange, FilterCriteria,
    NotionDatabase, PostView, RedditPost, RemotePost, SavePostRequest, SavePostResponse,
    SavedPostRecord, SessionGrant, SortMode, User, DEFAULT_POST_LIMIT,
};
