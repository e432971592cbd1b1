//! Output formatting for CLI commands

use serde::Serialize;

use crate::api::{NotionDatabase, RemotePost};
use crate::notification::ToastManager;

/// Format output as JSON (pretty)
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 单行帖子摘要
pub fn format_post_line(post: &RemotePost) -> String {
    let marker = if post.saved { "★" } else { " " };
    format!(
        "{} [{}] r/{} | ⬆ {} | {} | {}",
        marker, post.id, post.subreddit, post.score, post.author, post.title
    )
}

/// 帖子列表（人类可读）
pub fn format_posts(posts: &[RemotePost]) -> String {
    if posts.is_empty() {
        return "没有找到帖子".to_string();
    }

    let mut lines = vec![format!("共 {} 个帖子:\n", posts.len())];
    for post in posts {
        lines.push(format_post_line(post));
        if !post.url.is_empty() {
            lines.push(format!("      {}", post.url));
        }
        if let Some(notion_url) = post.notion_page_url.as_deref().filter(|u| !u.is_empty()) {
            lines.push(format!("      Notion: {}", notion_url));
        }
    }
    lines.join("\n")
}

pub fn format_databases(databases: &[NotionDatabase]) -> String {
    if databases.is_empty() {
        return "没有可用的 Notion 数据库，请先在 Notion 中授权页面".to_string();
    }

    databases
        .iter()
        .map(|db| format!("  {} | {} | {}", db.id, db.title, db.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 把当前 toast 打印到 stderr 并清空
pub fn flush_toasts(toasts: &ToastManager) {
    for toast in toasts.toasts() {
        eprintln!("{} {}", toast.kind.icon(), toast.message);
    }
    toasts.clear();
}
