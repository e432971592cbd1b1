//! 凭证附加策略
//!
//! 后端支持两种认证方式，每次部署只选一种：
//! - `BearerToken`：token 存在本地文件，每个请求带 `Authorization: Bearer <token>`
//! - `SessionCookie`：服务端下发 cookie，由 HTTP 客户端的 cookie jar 自动携带

use reqwest::{ClientBuilder, RequestBuilder};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::error::ApiError;
use super::token_store::TokenStore;

/// 认证方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Bearer,
    Cookie,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Bearer => "bearer",
            AuthMode::Cookie => "cookie",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bearer" | "header" | "token" => Ok(AuthMode::Bearer),
            "cookie" | "session" => Ok(AuthMode::Cookie),
            other => Err(format!("Unknown auth mode: {}", other)),
        }
    }
}

/// 给请求附加凭证的策略
pub trait CredentialStrategy: Send + Sync + fmt::Debug {
    /// 策略名称（用于日志）
    fn name(&self) -> &str;

    /// 构建 HTTP 客户端时的额外配置
    fn configure(&self, builder: ClientBuilder) -> ClientBuilder {
        builder
    }

    /// 给单个请求附加凭证
    fn attach(&self, request: RequestBuilder) -> RequestBuilder;

    /// 换取会话成功后保存持久凭证
    fn store(&self, token: &str) -> Result<(), ApiError>;

    /// 登出时清除本地凭证
    fn clear(&self) -> Result<(), ApiError>;

    /// 本地是否持有凭证（cookie 模式无法判断，总是 true）
    fn has_credential(&self) -> bool;
}

/// Bearer token 策略
///
/// 创建时从文件读取一次 token，之后只在 `store`/`clear` 时读写磁盘，
/// 请求路径上不做文件 I/O。
#[derive(Debug)]
pub struct BearerToken {
    store: TokenStore,
    cached: RwLock<Option<String>>,
}

impl BearerToken {
    pub fn new(store: TokenStore) -> Self {
        let cached = RwLock::new(store.load());
        Self { store, cached }
    }

    fn token(&self) -> Option<String> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl CredentialStrategy for BearerToken {
    fn name(&self) -> &str {
        "bearer"
    }

    fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn store(&self, token: &str) -> Result<(), ApiError> {
        self.store.save(token).map_err(ApiError::Credentials)?;
        self.set_token(Some(token.trim().to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        self.store.clear().map_err(ApiError::Credentials)?;
        self.set_token(None);
        Ok(())
    }

    fn has_credential(&self) -> bool {
        self.token().is_some()
    }
}

/// Cookie 会话策略
#[derive(Debug, Clone, Default)]
pub struct SessionCookie;

impl CredentialStrategy for SessionCookie {
    fn name(&self) -> &str {
        "cookie"
    }

    fn configure(&self, builder: ClientBuilder) -> ClientBuilder {
        builder.cookie_store(true)
    }

    fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    fn store(&self, _token: &str) -> Result<(), ApiError> {
        debug!("Session cookie managed by server, nothing to store");
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        Ok(())
    }

    fn has_credential(&self) -> bool {
        true
    }
}

/// 根据认证方式创建策略
pub fn strategy_for(mode: AuthMode, store: TokenStore) -> Arc<dyn CredentialStrategy> {
    match mode {
        AuthMode::Bearer => Arc::new(BearerToken::new(store)),
        AuthMode::Cookie => Arc::new(SessionCookie),
    }
}
