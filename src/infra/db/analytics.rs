use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::application::repos::{
    AnalyticsRepo, AnalyticsTotals, MonthlyBucket, RepoError, TopPostRecord,
};
use crate::domain::entities::{CommentRecord, NewsletterRecord, PostRecord};

use super::comments::CommentRow;
use super::newsletters::NewsletterRow;
use super::posts::{POST_COLUMNS, PostRow};
use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TotalsRow {
    posts: i64,
    views: i64,
    comments: i64,
    newsletters: i64,
}

#[derive(sqlx::FromRow)]
struct TopPostRow {
    id: i64,
    title: String,
    views: i64,
}

#[derive(sqlx::FromRow)]
struct MonthlyRow {
    month_start: Date,
    posts: i64,
    views: i64,
}

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn totals(&self) -> Result<AnalyticsTotals, RepoError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM posts) AS views,
                (SELECT COUNT(*) FROM comments) AS comments,
                (SELECT COUNT(*) FROM newsletters) AS newsletters
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(AnalyticsTotals {
            posts: row.posts,
            views: row.views,
            comments: row.comments,
            newsletters: row.newsletters,
        })
    }

    async fn top_posts(&self, limit: u32) -> Result<Vec<TopPostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TopPostRow>(
            "SELECT id, title, views FROM posts ORDER BY views DESC, id ASC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TopPostRecord {
                id: row.id,
                title: row.title,
                views: row.views,
            })
            .collect())
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn recent_comments(&self, limit: u32) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_name, author_email, content, approved, created_at
            FROM comments
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn recent_subscribers(&self, limit: u32) -> Result<Vec<NewsletterRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NewsletterRow>(
            r#"
            SELECT id, email, name, is_active, subscribed_at
            FROM newsletters
            ORDER BY subscribed_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NewsletterRecord::from).collect())
    }

    async fn monthly_buckets(
        &self,
        since: Option<OffsetDateTime>,
    ) -> Result<Vec<MonthlyBucket>, RepoError> {
        let rows = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT
                (date_trunc('month', created_at AT TIME ZONE 'UTC'))::DATE AS month_start,
                COUNT(*) AS posts,
                COALESCE(SUM(views), 0)::BIGINT AS views
            FROM posts
            WHERE $1::TIMESTAMPTZ IS NULL OR created_at >= $1
            GROUP BY month_start
            ORDER BY month_start ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| MonthlyBucket {
                month_start: row.month_start,
                posts: row.posts,
                views: row.views,
            })
            .collect())
    }
}
