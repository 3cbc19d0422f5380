//! Conversions from domain records into the wire types of `lekha-api-types`.

pub use lekha_api_types::*;

use crate::application::analytics::{ActivityItem, AnalyticsReport, MonthlyStat as MonthlyRow};
use crate::application::generation::GeneratedDraft;
use crate::application::repos::TopPostRecord;
use crate::domain::entities::{
    CategoryRecord, CommentRecord, MediaRecord, PostRecord, PostWithAuthor,
};
use crate::domain::posts::DEFAULT_AUTHOR_NAME;

impl From<PostRecord> for PostSummary {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            views: post.views,
            reading_time: post.reading_time,
            created_at: post.created_at,
        }
    }
}

impl From<PostRecord> for PostView {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published: post.published,
            views: post.views,
            reading_time: post.reading_time,
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostWithAuthor> for PostDetail {
    fn from(value: PostWithAuthor) -> Self {
        let PostWithAuthor { post, author_name } = value;
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            views: post.views,
            reading_time: post.reading_time,
            author_name: author_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<PostRecord> for SearchResult {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
        }
    }
}

// Author emails are never echoed back to readers.
impl From<CommentRecord> for CommentView {
    fn from(comment: CommentRecord) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            author_name: comment.author_name,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

impl From<CategoryRecord> for CategoryView {
    fn from(category: CategoryRecord) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            created_at: category.created_at,
        }
    }
}

impl From<MediaRecord> for MediaView {
    fn from(media: MediaRecord) -> Self {
        Self {
            id: media.id,
            filename: media.filename,
            url: media.url,
            mime_type: media.mime_type,
            size: media.size,
            created_at: media.created_at,
        }
    }
}

impl From<GeneratedDraft> for GeneratedPostResponse {
    fn from(draft: GeneratedDraft) -> Self {
        Self {
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            cover_image: draft.cover_image,
        }
    }
}

impl From<TopPostRecord> for TopPost {
    fn from(post: TopPostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title,
            views: post.views,
        }
    }
}

impl From<ActivityItem> for ActivityEntry {
    fn from(item: ActivityItem) -> Self {
        Self {
            kind: item.kind.as_str().to_string(),
            description: item.description,
            created_at: item.created_at,
        }
    }
}

impl From<MonthlyRow> for MonthlyStat {
    fn from(row: MonthlyRow) -> Self {
        Self {
            key: row.key,
            month: row.label,
            posts: row.posts,
            views: row.views,
        }
    }
}

impl From<AnalyticsReport> for AnalyticsResponse {
    fn from(report: AnalyticsReport) -> Self {
        Self {
            range: report.range.as_str().to_string(),
            total_posts: report.totals.posts,
            total_views: report.totals.views,
            total_comments: report.totals.comments,
            total_newsletters: report.totals.newsletters,
            top_posts: report.top_posts.into_iter().map(Into::into).collect(),
            recent_activity: report.recent_activity.into_iter().map(Into::into).collect(),
            monthly_stats: report.monthly_stats.into_iter().map(Into::into).collect(),
        }
    }
}
