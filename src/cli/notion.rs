// src/cli/notion.rs
//! Notion 相关命令: databases / save / saved / delete / create-database

use anyhow::{anyhow, Context, Result};
use clap::Args;
use dialoguer::Select;
use tracing::debug;

use super::output::{format_databases, format_json, format_posts};
use super::posts::FilterArgs;
use crate::api::{ApiClient, NotionDatabase};
use crate::notification::ToastManager;

/// save 命令参数
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// 要保存的帖子 id
    pub post_id: String,

    /// 目标数据库 id（省略时交互选择）
    #[arg(long, short)]
    pub database: Option<String>,

    /// 用于查找帖子的过滤条件
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// delete 命令参数
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// 已保存帖子的 Reddit id
    pub post_id: String,
}

/// create-database 命令参数
#[derive(Args, Debug)]
pub struct CreateDatabaseArgs {
    /// 父页面 id（需已授权给集成）
    pub parent_page_id: String,
}

pub async fn handle_databases(client: &ApiClient, json: bool) -> Result<()> {
    let databases = client.notion_databases().await?;
    if json {
        println!("{}", format_json(&databases));
    } else {
        println!("{}", format_databases(&databases));
    }
    Ok(())
}

/// 保存帖子：先按过滤条件找到帖子，再确定目标数据库
pub async fn handle_save(client: &ApiClient, toasts: &ToastManager, args: SaveArgs) -> Result<()> {
    let posts = client.list_posts(&args.filter.criteria()).await?;
    let post = posts
        .iter()
        .find(|p| p.id == args.post_id)
        .ok_or_else(|| anyhow!("Post {} not found in the current listing", args.post_id))?;

    let database_id = match args.database {
        Some(id) => id,
        None => {
            let databases = client.notion_databases().await?;
            pick_database(&databases)?.id.clone()
        }
    };

    debug!(post_id = %post.id, database_id = %database_id, "Saving post");
    let response = client
        .save_post_from(post, &database_id)
        .await?;

    if !response.notion_page_url.is_empty() {
        println!("{}", response.notion_page_url);
    }
    let message = if response.message.is_empty() {
        "Post saved to Notion".to_string()
    } else {
        response.message
    };
    toasts.success(message, None);
    Ok(())
}

fn pick_database(databases: &[NotionDatabase]) -> Result<&NotionDatabase> {
    match databases {
        [] => Err(anyhow!(
            "No Notion databases available. Share a database with the integration or run `re2no create-database`"
        )),
        [only] => Ok(only),
        _ => {
            let selection = Select::new()
                .with_prompt("选择 Notion 数据库")
                .items(databases)
                .default(0)
                .interact()
                .context("读取数据库选择失败")?;
            Ok(&databases[selection])
        }
    }
}

pub async fn handle_saved(client: &ApiClient, json: bool) -> Result<()> {
    let posts = client.saved_posts().await?;
    if json {
        println!("{}", format_json(&posts));
    } else {
        println!("{}", format_posts(&posts));
    }
    Ok(())
}

pub async fn handle_delete(client: &ApiClient, toasts: &ToastManager, args: DeleteArgs) -> Result<()> {
    client.delete_saved_post(&args.post_id).await?;
    toasts.success(format!("Removed saved post {}", args.post_id), None);
    Ok(())
}

pub async fn handle_create_database(
    client: &ApiClient,
    toasts: &ToastManager,
    args: CreateDatabaseArgs,
) -> Result<()> {
    let created = client.create_database(&args.parent_page_id).await?;
    println!("{} {}", created.database_id, created.database_url);
    toasts.success(format!("Created database {}", created.database_id), None);
    Ok(())
}
