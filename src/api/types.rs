//! 请求/响应类型以及服务端字段到客户端形状的映射

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// 默认每次拉取的帖子数量（与服务端默认一致）
pub const DEFAULT_POST_LIMIT: u32 = 25;

// ============================================================================
// 过滤条件
// ============================================================================

/// 排序方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::New => "new",
            SortMode::Top => "top",
            SortMode::Rising => "rising",
            SortMode::Controversial => "controversial",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hot" => Ok(SortMode::Hot),
            "new" => Ok(SortMode::New),
            "top" => Ok(SortMode::Top),
            "rising" => Ok(SortMode::Rising),
            "controversial" => Ok(SortMode::Controversial),
            other => Err(format!("Unknown sort mode: {}", other)),
        }
    }
}

/// 时间范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Hour,
    Day,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Hour => "hour",
            DateRange::Day => "day",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::Year => "year",
            DateRange::All => "all",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(DateRange::Hour),
            "day" | "today" => Ok(DateRange::Day),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "year" => Ok(DateRange::Year),
            "all" | "" => Ok(DateRange::All),
            other => Err(format!("Unknown date range: {}", other)),
        }
    }
}

/// 列表视图：全部，或只看还没保存到 Notion 的
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostView {
    #[default]
    All,
    Unsaved,
}

/// 帖子过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub subreddits: Vec<String>,
    pub keyword: Option<String>,
    pub date_range: DateRange,
    pub sort: SortMode,
    pub limit: u32,
    pub view: PostView,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            subreddits: Vec::new(),
            keyword: None,
            date_range: DateRange::All,
            sort: SortMode::Hot,
            limit: DEFAULT_POST_LIMIT,
            view: PostView::All,
        }
    }
}

impl FilterCriteria {
    /// 序列化为查询参数
    ///
    /// - `subreddits`: 去掉 `r/` 前缀后逗号拼接，列表为空时省略
    /// - `keyword`: 去空白后为空则省略
    /// - `date_range`: `all` 时省略
    /// - `sort` 和 `limit` 总是发送
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        let subreddits: Vec<&str> = self
            .subreddits
            .iter()
            .map(|s| normalize_subreddit(s))
            .filter(|s| !s.is_empty())
            .collect();
        if !subreddits.is_empty() {
            pairs.push(("subreddits", subreddits.join(",")));
        }

        if let Some(keyword) = self.keyword.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                pairs.push(("keyword", keyword.to_string()));
            }
        }

        pairs.push(("sort", self.sort.as_str().to_string()));

        if self.date_range != DateRange::All {
            pairs.push(("date_range", self.date_range.as_str().to_string()));
        }

        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

/// 去掉首尾空白和 `r/` 前缀
pub fn normalize_subreddit(name: &str) -> &str {
    let trimmed = name.trim();
    trimmed.strip_prefix("r/").unwrap_or(trimmed).trim()
}

// ============================================================================
// 帖子
// ============================================================================

/// 客户端使用的帖子形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    pub author: String,
    pub score: i64,
    /// ISO-8601 时间
    pub created: String,
    pub url: String,
    /// 是否已保存到 Notion
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_page_url: Option<String>,
}

/// `/api/reddit/posts` 返回的原始帖子
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub selftext_html: Option<String>,
    #[serde(default)]
    pub is_video: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    #[serde(default)]
    pub posts: Vec<RedditPost>,
}

impl From<RedditPost> for RemotePost {
    fn from(post: RedditPost) -> Self {
        let url = if post.permalink.is_empty() {
            post.url
        } else {
            format!("{}{}", REDDIT_BASE_URL, post.permalink)
        };

        Self {
            id: post.id,
            title: post.title,
            subreddit: post.subreddit,
            content: post.selftext,
            content_html: post.selftext_html.filter(|h| !h.is_empty()),
            author: post.author,
            score: post.score,
            created: format_created_utc(post.created_utc),
            url,
            saved: false,
            notion_page_url: None,
        }
    }
}

/// Unix 秒（可带小数）转 RFC3339；非法值返回空字符串
fn format_created_utc(created_utc: f64) -> String {
    if !created_utc.is_finite() || created_utc <= 0.0 {
        return String::new();
    }
    let secs = created_utc.trunc() as i64;
    let nanos = (created_utc.fract() * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

/// `/api/notion/saved-posts` 返回的已保存记录
#[derive(Debug, Clone, Deserialize)]
pub struct SavedPostRecord {
    pub reddit_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub saved_at: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notion_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SavedPostsEnvelope {
    #[serde(default)]
    pub posts: Vec<SavedPostRecord>,
}

impl From<SavedPostRecord> for RemotePost {
    fn from(record: SavedPostRecord) -> Self {
        Self {
            id: record.reddit_id,
            title: record.title,
            subreddit: record.subreddit,
            content: record.content.unwrap_or_default(),
            content_html: None,
            author: record.author,
            score: record.score,
            created: record.saved_at,
            url: record.url,
            saved: true,
            notion_page_url: Some(record.notion_page_url.unwrap_or_default()),
        }
    }
}

/// 用已保存列表标记帖子的保存状态
pub fn mark_saved(posts: Vec<RemotePost>, saved: &[RemotePost]) -> Vec<RemotePost> {
    posts
        .into_iter()
        .map(|mut post| {
            if let Some(record) = saved.iter().find(|s| s.id == post.id) {
                post.saved = true;
                post.notion_page_url = Some(record.notion_page_url.clone().unwrap_or_default());
            }
            post
        })
        .collect()
}

/// 只保留尚未保存的帖子
pub fn only_unsaved(posts: Vec<RemotePost>, saved: &[RemotePost]) -> Vec<RemotePost> {
    let saved_ids: HashSet<&str> = saved.iter().map(|s| s.id.as_str()).collect();
    posts
        .into_iter()
        .filter(|p| !p.saved && !saved_ids.contains(p.id.as_str()))
        .collect()
}

// ============================================================================
// 认证
// ============================================================================

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub notion_user_id: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: String,
    #[serde(default)]
    pub bot_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExchangeTokenRequest<'a> {
    pub token: &'a str,
}

/// 短期 token 换取的持久会话
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionGrant {
    /// 持久 token（cookie 模式下服务端可能不返回）
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageEnvelope {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUrlEnvelope {
    pub url: String,
}

// ============================================================================
// Notion
// ============================================================================

/// 可保存到的 Notion 数据库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionDatabase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl fmt::Display for NotionDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatabasesEnvelope {
    #[serde(default)]
    pub databases: Vec<NotionDatabase>,
}

/// 保存帖子请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePostRequest {
    pub title: String,
    pub subreddit: String,
    pub content: String,
    pub author: String,
    pub score: i64,
    pub url: String,
    pub reddit_id: String,
    pub database_id: String,
}

impl SavePostRequest {
    /// 从列表中的帖子构造
    pub fn from_post(post: &RemotePost, database_id: impl Into<String>) -> Self {
        Self {
            title: post.title.clone(),
            subreddit: post.subreddit.clone(),
            content: post.content.clone(),
            author: post.author.clone(),
            score: post.score,
            url: post.url.clone(),
            reddit_id: post.id.clone(),
            database_id: database_id.into(),
        }
    }
}

/// 保存结果
#[derive(Debug, Clone, Deserialize)]
pub struct SavePostResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notion_page_id: String,
    #[serde(default)]
    pub notion_page_url: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDatabaseRequest<'a> {
    pub parent_page_id: &'a str,
}

/// 新建数据库结果
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedDatabase {
    #[serde(default)]
    pub success: bool,
    pub database_id: String,
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub message: String,
}
