use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{CommentOrder, CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

pub(crate) const METRIC_COMMENTS_SUBMITTED_TOTAL: &str = "lekha_comments_submitted_total";

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("post `{0}` does not exist")]
    UnknownPost(i64),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Raw visitor submission; every field must be present and non-blank.
#[derive(Debug, Clone, Default)]
pub struct CommentSubmission {
    pub post_id: Option<i64>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn CommentsRepo>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentsRepo>) -> Self {
        Self { repo }
    }

    /// Store a comment behind the moderation gate.
    pub async fn submit(&self, submission: CommentSubmission) -> Result<CommentRecord, CommentError> {
        let params = validate(submission)?;
        let post_id = params.post_id;

        let record = self
            .repo
            .create_comment(params)
            .await
            .map_err(|err| match err {
                RepoError::InvalidInput { .. } => CommentError::UnknownPost(post_id),
                other => CommentError::Repo(other),
            })?;

        counter!(METRIC_COMMENTS_SUBMITTED_TOTAL).increment(1);
        info!(
            target = "lekha::comments",
            comment_id = record.id,
            post_id,
            "comment submitted for review"
        );
        Ok(record)
    }

    /// Approved comments for a post, oldest first.
    pub async fn list_approved(&self, post_id: i64) -> Result<Vec<CommentRecord>, CommentError> {
        self.repo
            .list_approved(post_id, CommentOrder::OldestFirst)
            .await
            .map_err(CommentError::from)
    }
}

fn validate(submission: CommentSubmission) -> Result<CreateCommentParams, CommentError> {
    const MISSING: &str = "postId, authorName, authorEmail and content are required";

    let post_id = submission.post_id.ok_or(CommentError::Validation(MISSING))?;
    let author_name = required(submission.author_name).ok_or(CommentError::Validation(MISSING))?;
    let author_email =
        required(submission.author_email).ok_or(CommentError::Validation(MISSING))?;
    let content = required(submission.content).ok_or(CommentError::Validation(MISSING))?;

    Ok(CreateCommentParams {
        post_id,
        author_name,
        author_email,
        content,
    })
}

/// Blank means empty after trimming; accepted values are stored as submitted.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
