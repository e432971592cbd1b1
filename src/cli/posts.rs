// src/cli/posts.rs
//! posts 命令 - 按条件拉取 Reddit 帖子

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::output::{format_json, format_posts};
use crate::api::{
    mark_saved, ApiClient, DateRange, FilterCriteria, PostView, SortMode, DEFAULT_POST_LIMIT,
};
use crate::notification::ToastManager;

/// 帖子过滤参数（posts 和 save 共用）
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Subreddit，可重复或逗号分隔（如 -s rust -s r/golang）
    #[arg(long = "subreddit", short = 's', value_delimiter = ',')]
    pub subreddits: Vec<String>,

    /// 关键词
    #[arg(long, short)]
    pub keyword: Option<String>,

    /// 排序: hot, new, top, rising, controversial
    #[arg(long, default_value = "hot")]
    pub sort: SortMode,

    /// 时间范围: hour, day, week, month, year, all
    #[arg(long = "range", default_value = "all")]
    pub date_range: DateRange,

    /// 数量上限
    #[arg(long, short = 'n', default_value_t = DEFAULT_POST_LIMIT)]
    pub limit: u32,

    /// 只显示尚未保存到 Notion 的帖子
    #[arg(long)]
    pub unsaved: bool,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            subreddits: self.subreddits.clone(),
            keyword: self.keyword.clone(),
            date_range: self.date_range,
            sort: self.sort,
            limit: self.limit,
            view: if self.unsaved {
                PostView::Unsaved
            } else {
                PostView::All
            },
        }
    }
}

/// posts 命令参数
#[derive(Args, Debug)]
pub struct PostsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// 同时标记已保存的帖子（额外请求一次已保存列表）
    #[arg(long)]
    pub mark_saved: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 posts 命令
pub async fn handle_posts(client: &ApiClient, toasts: &ToastManager, args: PostsArgs) -> Result<()> {
    let criteria = args.filter.criteria();
    let mut posts = client.list_posts(&criteria).await?;

    if args.mark_saved && criteria.view == PostView::All {
        let saved = client.saved_posts().await?;
        posts = mark_saved(posts, &saved);
    }

    info!(count = posts.len(), "Posts fetched");

    if args.json {
        println!("{}", format_json(&posts));
    } else {
        println!("{}", format_posts(&posts));
    }

    if posts.is_empty() {
        toasts.info("No posts matched the filters", None);
    }
    Ok(())
}
