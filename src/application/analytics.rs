use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};

use crate::application::repos::{AnalyticsRepo, AnalyticsTotals, RepoError, TopPostRecord};
use crate::domain::types::{ActivityKind, AnalyticsRange};

pub const TOP_POSTS_LIMIT: u32 = 5;
pub const RECENT_POSTS_LIMIT: u32 = 3;
pub const RECENT_COMMENTS_LIMIT: u32 = 3;
pub const RECENT_SUBSCRIBERS_LIMIT: u32 = 2;
pub const RECENT_ACTIVITY_LIMIT: usize = 8;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyStat {
    /// `YYYY-MM`
    pub key: String,
    /// Abbreviated month name, e.g. `Mar`.
    pub label: String,
    pub posts: i64,
    pub views: i64,
}

#[derive(Debug, Clone)]
pub struct AnalyticsReport {
    pub range: AnalyticsRange,
    pub totals: AnalyticsTotals,
    pub top_posts: Vec<TopPostRecord>,
    pub recent_activity: Vec<ActivityItem>,
    pub monthly_stats: Vec<MonthlyStat>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepo>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepo>) -> Self {
        Self { repo }
    }

    pub async fn report(&self, range: AnalyticsRange) -> Result<AnalyticsReport, AnalyticsError> {
        self.report_at(range, OffsetDateTime::now_utc()).await
    }

    async fn report_at(
        &self,
        range: AnalyticsRange,
        now: OffsetDateTime,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let totals = self.repo.totals().await?;
        let top_posts = self.repo.top_posts(TOP_POSTS_LIMIT).await?;
        let recent_activity = self.recent_activity().await?;
        let monthly_stats = self
            .repo
            .monthly_buckets(range.since(now))
            .await?
            .into_iter()
            .map(|bucket| MonthlyStat {
                key: bucket
                    .month_start
                    .format(format_description!("[year]-[month]"))
                    .unwrap_or_default(),
                label: bucket
                    .month_start
                    .format(format_description!("[month repr:short]"))
                    .unwrap_or_default(),
                posts: bucket.posts,
                views: bucket.views,
            })
            .collect();

        Ok(AnalyticsReport {
            range,
            totals,
            top_posts,
            recent_activity,
            monthly_stats,
        })
    }

    async fn recent_activity(&self) -> Result<Vec<ActivityItem>, AnalyticsError> {
        let posts = self.repo.recent_posts(RECENT_POSTS_LIMIT).await?;
        let comments = self.repo.recent_comments(RECENT_COMMENTS_LIMIT).await?;
        let subscribers = self.repo.recent_subscribers(RECENT_SUBSCRIBERS_LIMIT).await?;

        let mut items: Vec<ActivityItem> = posts
            .into_iter()
            .map(|post| ActivityItem {
                kind: ActivityKind::Post,
                description: format!("New post: {}", post.title),
                created_at: post.created_at,
            })
            .chain(comments.into_iter().map(|comment| ActivityItem {
                kind: ActivityKind::Comment,
                description: format!("New comment by {}", comment.author_name),
                created_at: comment.created_at,
            }))
            .chain(subscribers.into_iter().map(|subscriber| ActivityItem {
                kind: ActivityKind::Newsletter,
                description: format!("New subscriber: {}", subscriber.email),
                created_at: subscriber.subscribed_at,
            }))
            .collect();

        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(RECENT_ACTIVITY_LIMIT);
        Ok(items)
    }
}
