//! 客户端配置
//!
//! 读取优先级（逐字段）：
//! 1. 配置文件 `~/.config/re2no/config.json`（字段 `api_url`、`auth_mode`、`timeout_ms`、`token_path`）
//! 2. 环境变量 `RE2NO_API_URL`、`RE2NO_AUTH_MODE`
//! 3. 默认值

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::api::{AuthMode, TokenStore};

/// 默认后端地址
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// 默认请求超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_API_URL: &str = "RE2NO_API_URL";
pub const ENV_AUTH_MODE: &str = "RE2NO_AUTH_MODE";

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 后端基础 URL（不带末尾 `/`）
    pub base_url: String,
    /// 请求超时（毫秒）
    pub timeout_ms: u64,
    /// 认证方式
    pub auth_mode: AuthMode,
    /// bearer 模式下 token 文件位置
    pub token_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auth_mode: AuthMode::default(),
            token_path: TokenStore::default_path(),
        }
    }
}

impl ClientConfig {
    /// 默认配置文件路径
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/re2no/config.json"))
    }

    /// 从配置文件和环境变量自动加载
    pub fn auto_load() -> Result<Self> {
        let file = match Self::config_path() {
            Some(path) if path.exists() => read_config_file(&path),
            _ => None,
        };
        Self::resolve(file.as_ref(), |key| std::env::var(key).ok())
    }

    /// 按优先级合并配置文件、环境变量和默认值
    pub fn resolve<F>(file: Option<&serde_json::Value>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let file_str = |key: &str| {
            file.and_then(|f| f.get(key))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let env_str = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = file_str("api_url")
            .or_else(|| env_str(ENV_API_URL))
            .map(|u| normalize_base_url(&u))
            .unwrap_or(defaults.base_url);

        let auth_mode = match file_str("auth_mode").or_else(|| env_str(ENV_AUTH_MODE)) {
            Some(mode) => mode.parse::<AuthMode>().map_err(|e| anyhow!(e))?,
            None => defaults.auth_mode,
        };

        let timeout_ms = file
            .and_then(|f| f.get("timeout_ms"))
            .and_then(|v| v.as_u64())
            .filter(|t| *t > 0)
            .unwrap_or(defaults.timeout_ms);

        let token_path = file_str("token_path")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path);

        debug!(base_url = %base_url, auth_mode = %auth_mode, timeout_ms, "Client config resolved");

        Ok(Self {
            base_url,
            timeout_ms,
            auth_mode,
            token_path,
        })
    }

    /// 从指定文件加载（文件必须存在且是合法 JSON）
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        Self::resolve(Some(&value), |key| std::env::var(key).ok())
    }

    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(self.token_path.clone())
    }
}

fn read_config_file(path: &Path) -> Option<serde_json::Value> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
            None
        }
    }
}

/// 去掉末尾的 `/`
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
