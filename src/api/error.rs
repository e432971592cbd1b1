//! API 调用错误类型

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Remote Access Layer 错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 服务端返回 401，调用方通常应引导用户重新登录
    #[error("Not authenticated. Please log in.")]
    NotAuthenticated,

    /// 其他非 2xx 响应
    #[error("{message} (HTTP {status})")]
    Remote { status: u16, message: String },

    /// 网络/传输层失败
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 成功响应但响应体无法解析
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// 本地凭证存储失败
    #[error("Credential storage error")]
    Credentials(#[source] anyhow::Error),

    /// 请求发出前的本地校验失败
    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

impl ApiError {
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated)
    }

    /// HTTP 状态码（仅服务端错误有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotAuthenticated => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 根据失败响应构造错误
    ///
    /// 响应体是带 `error` 字段的 JSON 时使用该字段，否则回退到状态码的标准文本。
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::NotAuthenticated;
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status_text(status));

        ApiError::Remote {
            status: status.as_u16(),
            message,
        }
    }
}

/// 服务端错误响应体
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| status.as_str().to_string())
}
