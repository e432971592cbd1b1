// src/cli/auth.rs
//! 认证相关命令: user / login / exchange / logout

use anyhow::Result;
use clap::Args;

use super::output::format_json;
use crate::api::ApiClient;
use crate::notification::ToastManager;

/// exchange 命令参数
#[derive(Args, Debug)]
pub struct ExchangeArgs {
    /// OAuth 回调页面拿到的短期 token
    pub token: String,
}

/// 显示当前登录用户
pub async fn handle_user(client: &ApiClient, toasts: &ToastManager, json: bool) -> Result<()> {
    match client.current_user().await? {
        Some(user) if json => println!("{}", format_json(&user)),
        Some(user) => {
            println!("用户信息:");
            println!("  名称: {}", user.name);
            println!("  邮箱: {}", user.email);
            println!("  工作区: {}", user.workspace_name);
        }
        None => {
            toasts.info("Not logged in. Run `re2no login` to sign in with Notion.", None);
        }
    }
    Ok(())
}

/// 打印 Notion 授权地址
pub async fn handle_login(client: &ApiClient, toasts: &ToastManager) -> Result<()> {
    let url = client.notion_auth_url().await?;
    println!("{}", url);
    toasts.info(
        "Open the URL above, then run `re2no exchange <token>` with the token from the callback page",
        None,
    );
    Ok(())
}

/// 换取持久会话
pub async fn handle_exchange(
    client: &ApiClient,
    toasts: &ToastManager,
    args: ExchangeArgs,
) -> Result<()> {
    let user = client.exchange_token(&args.token).await?;
    let who = user
        .map(|u| if u.email.is_empty() { u.name } else { u.email })
        .unwrap_or_else(|| "unknown user".to_string());
    toasts.success(format!("Logged in as {}", who), None);
    Ok(())
}

pub async fn handle_logout(client: &ApiClient, toasts: &ToastManager) -> Result<()> {
    let message = client.logout().await?;
    toasts.success(message, None);
    Ok(())
}
