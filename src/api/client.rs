//! re2no 后端 HTTP 客户端
//!
//! 每个操作都是一次独立的请求/响应：拼接 URL，附加凭证，发送，检查状态码，
//! 解析 JSON 并转换成客户端形状。不重试，不缓存。

use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::credentials::{strategy_for, CredentialStrategy};
use super::error::ApiError;
use super::types::{
    only_unsaved, AuthUrlEnvelope, CreateDatabaseRequest, CreatedDatabase, DatabasesEnvelope,
    ExchangeTokenRequest, FilterCriteria, MessageEnvelope, NotionDatabase, PostView,
    PostsEnvelope, RemotePost, SavePostRequest, SavePostResponse, SavedPostsEnvelope,
    SessionGrant, User, UserEnvelope,
};
use crate::config::{normalize_base_url, ClientConfig};

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStrategy>,
}

impl ApiClient {
    /// 按配置创建客户端，认证方式由 `config.auth_mode` 决定
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let credentials = strategy_for(config.auth_mode, config.token_store());
        Self::with_credentials(config, credentials)
    }

    /// 使用指定的凭证策略创建客户端
    pub fn with_credentials(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStrategy>,
    ) -> Result<Self, ApiError> {
        let builder = Client::builder().timeout(Duration::from_millis(config.timeout_ms));
        let http = credentials.configure(builder).build()?;

        debug!(
            base_url = %config.base_url,
            auth = credentials.name(),
            "API client created"
        );

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.base_url),
            credentials,
        })
    }

    pub fn credentials(&self) -> &dyn CredentialStrategy {
        self.credentials.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 带凭证的请求
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.credentials.attach(self.http.request(method, self.url(path)))
    }

    /// 发送请求，非 2xx 转为 `ApiError`
    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(op, status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);
        if err.is_not_authenticated() {
            debug!(op, "Not authenticated");
        } else {
            warn!(op, status = status.as_u16(), error = %err, "API request failed");
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    // ========================================================================
    // Reddit
    // ========================================================================

    /// 按过滤条件获取帖子
    ///
    /// `PostView::Unsaved` 会额外拉取已保存列表并过滤掉已保存的帖子。
    pub async fn list_posts(&self, criteria: &FilterCriteria) -> Result<Vec<RemotePost>, ApiError> {
        let query = criteria.query_pairs();
        debug!(?query, view = ?criteria.view, "Fetching posts");

        let response = self
            .send(
                "list_posts",
                self.request(Method::GET, "/api/reddit/posts").query(&query),
            )
            .await?;
        let envelope: PostsEnvelope = Self::decode(response).await?;
        let posts: Vec<RemotePost> = envelope.posts.into_iter().map(RemotePost::from).collect();

        match criteria.view {
            PostView::All => Ok(posts),
            PostView::Unsaved => {
                let saved = self.saved_posts().await?;
                Ok(only_unsaved(posts, &saved))
            }
        }
    }

    // ========================================================================
    // 认证
    // ========================================================================

    /// 当前登录用户，未登录（401）时返回 `None`
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        match self
            .send("current_user", self.request(Method::GET, "/api/auth/user"))
            .await
        {
            Ok(response) => {
                let envelope: UserEnvelope = Self::decode(response).await?;
                Ok(envelope.user)
            }
            Err(ApiError::NotAuthenticated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 用 OAuth 回调拿到的短期 token 换取持久会话
    pub async fn exchange_token(&self, token: &str) -> Result<Option<User>, ApiError> {
        let token = token.trim();
        debug!(token_len = token.len(), "Exchanging token");

        let response = self
            .send(
                "exchange_token",
                self.http
                    .post(self.url("/api/auth/exchange-token"))
                    .json(&ExchangeTokenRequest { token }),
            )
            .await?;
        let grant: SessionGrant = Self::decode(response).await?;

        let durable = grant.token.as_deref().unwrap_or(token);
        self.credentials.store(durable)?;

        info!(
            user = grant.user.as_ref().map(|u| u.email.as_str()).unwrap_or(""),
            "Session established"
        );
        Ok(grant.user)
    }

    /// 结束会话并清除本地凭证
    ///
    /// 服务端返回 401 说明会话已失效，同样视为登出成功。
    pub async fn logout(&self) -> Result<String, ApiError> {
        let result = self
            .send("logout", self.request(Method::POST, "/api/auth/logout"))
            .await;

        let message = match result {
            Ok(response) => {
                let envelope: MessageEnvelope = Self::decode(response).await?;
                envelope.message
            }
            Err(ApiError::NotAuthenticated) => "already logged out".to_string(),
            Err(e) => return Err(e),
        };

        self.credentials.clear()?;
        info!("Logged out");
        Ok(message)
    }

    /// 获取 Notion OAuth 授权地址（不需要凭证）
    pub async fn notion_auth_url(&self) -> Result<String, ApiError> {
        let response = self
            .send(
                "notion_auth_url",
                self.http.get(self.url("/api/auth/notion/login")),
            )
            .await?;
        let envelope: AuthUrlEnvelope = Self::decode(response).await?;
        Ok(envelope.url)
    }

    // ========================================================================
    // Notion
    // ========================================================================

    /// 可保存到的 Notion 数据库列表
    pub async fn notion_databases(&self) -> Result<Vec<NotionDatabase>, ApiError> {
        let response = self
            .send(
                "notion_databases",
                self.request(Method::GET, "/api/notion/databases"),
            )
            .await?;
        let envelope: DatabasesEnvelope = Self::decode(response).await?;
        Ok(envelope.databases)
    }

    /// 保存帖子到指定数据库
    pub async fn save_post(&self, request: &SavePostRequest) -> Result<SavePostResponse, ApiError> {
        debug!(
            reddit_id = %request.reddit_id,
            database_id = %request.database_id,
            "Saving post to Notion"
        );
        let response = self
            .send(
                "save_post",
                self.request(Method::POST, "/api/notion/save").json(request),
            )
            .await?;
        Self::decode(response).await
    }

    /// 从列表中的帖子直接保存
    pub async fn save_post_from(
        &self,
        post: &RemotePost,
        database_id: &str,
    ) -> Result<SavePostResponse, ApiError> {
        self.save_post(&SavePostRequest::from_post(post, database_id))
            .await
    }

    /// 已保存的帖子（按保存时间倒序）
    pub async fn saved_posts(&self) -> Result<Vec<RemotePost>, ApiError> {
        let response = self
            .send(
                "saved_posts",
                self.request(Method::GET, "/api/notion/saved-posts"),
            )
            .await?;
        let envelope: SavedPostsEnvelope = Self::decode(response).await?;
        Ok(envelope.posts.into_iter().map(RemotePost::from).collect())
    }

    /// 按 Reddit id 删除已保存的帖子
    ///
    /// id 作为单个路径段编码，不能为空，也不能是 `.` / `..`。
    pub async fn delete_saved_post(&self, reddit_id: &str) -> Result<(), ApiError> {
        let reddit_id = reddit_id.trim();
        if reddit_id.is_empty() || reddit_id == "." || reddit_id == ".." {
            return Err(ApiError::InvalidInput(format!(
                "invalid saved post id: {:?}",
                reddit_id
            )));
        }

        let url = self.segment_url(&["api", "notion", "saved-posts", reddit_id])?;
        let request = self
            .credentials
            .attach(self.http.request(Method::DELETE, url));
        self.send("delete_saved_post", request).await?;
        debug!(reddit_id, "Saved post deleted");
        Ok(())
    }

    /// 在 base URL 后逐段追加路径，每段单独做百分号编码
    fn segment_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidInput(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidInput(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 在指定页面下新建用于保存帖子的数据库
    pub async fn create_database(&self, parent_page_id: &str) -> Result<CreatedDatabase, ApiError> {
        let response = self
            .send(
                "create_database",
                self.request(Method::POST, "/api/notion/create-database")
                    .json(&CreateDatabaseRequest {
                        parent_page_id: parent_page_id.trim(),
                    }),
            )
            .await?;
        Self::decode(response).await
    }
}
