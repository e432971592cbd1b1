//! re2no CLI
//!
//! 拉取 Reddit 帖子并通过 re2no 后端保存到 Notion

use anyhow::Result;
use clap::{Parser, Subcommand};
use re2no_client::{
    cli::{
        flush_toasts, CreateDatabaseArgs, DeleteArgs, ExchangeArgs, PostsArgs, SaveArgs,
    },
    ApiClient, ApiError, ClientConfig, ToastManager,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "re2no")]
#[command(about = "re2no - 拉取 Reddit 帖子并保存到 Notion")]
#[command(version)]
struct Cli {
    /// 后端地址（覆盖配置文件和 RE2NO_API_URL）
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 按条件拉取帖子
    Posts(PostsArgs),
    /// 显示当前登录用户
    User {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 获取 Notion 授权地址
    Login,
    /// 用回调 token 换取持久会话
    Exchange(ExchangeArgs),
    /// 登出并清除本地凭证
    Logout,
    /// 列出可保存到的 Notion 数据库
    Databases {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 保存帖子到 Notion
    Save(SaveArgs),
    /// 列出已保存的帖子
    Saved {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 删除已保存的帖子
    Delete(DeleteArgs),
    /// 新建用于保存帖子的 Notion 数据库
    CreateDatabase(CreateDatabaseArgs),
}

async fn run(command: Commands, client: &ApiClient, toasts: &ToastManager) -> Result<()> {
    use re2no_client::cli;

    match command {
        Commands::Posts(args) => cli::handle_posts(client, toasts, args).await,
        Commands::User { json } => cli::handle_user(client, toasts, json).await,
        Commands::Login => cli::handle_login(client, toasts).await,
        Commands::Exchange(args) => cli::handle_exchange(client, toasts, args).await,
        Commands::Logout => cli::handle_logout(client, toasts).await,
        Commands::Databases { json } => cli::handle_databases(client, json).await,
        Commands::Save(args) => cli::handle_save(client, toasts, args).await,
        Commands::Saved { json } => cli::handle_saved(client, json).await,
        Commands::Delete(args) => cli::handle_delete(client, toasts, args).await,
        Commands::CreateDatabase(args) => cli::handle_create_database(client, toasts, args).await,
    }
}

/// 错误转为面向用户的提示，未登录时给出登录指引
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_not_authenticated() => {
            format!("{} Run `re2no login` to sign in.", api)
        }
        _ => format!("{:#}", err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug re2no posts -s rust
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("re2no_client=info,re2no=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::auto_load()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.base_url = re2no_client::config::normalize_base_url(url);
    }
    debug!(base_url = %config.base_url, auth_mode = %config.auth_mode, "Using config");

    let client = ApiClient::new(&config)?;
    let toasts = ToastManager::new();

    let outcome = run(cli.command, &client, &toasts).await;
    if let Err(err) = &outcome {
        toasts.error(describe_error(err), None);
    }
    flush_toasts(&toasts);

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
