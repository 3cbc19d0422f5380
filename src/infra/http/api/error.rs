use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::analytics::AnalyticsError;
use crate::application::auth::{AuthError, TokenError};
use crate::application::comments::CommentError;
use crate::application::completion::CompletionError;
use crate::application::error::ErrorReport;
use crate::application::generation::GenerationError;
use crate::application::newsletter::NewsletterError;
use crate::application::posts::PostError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const ALREADY_SUBSCRIBED: &str = "already_subscribed";
    pub const UNKNOWN_POST: &str = "unknown_post";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const UPSTREAM: &str = "upstream_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// JSON error response. `detail` only reaches the logs, never the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: Cow<'static, str>,
    hint: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::VALIDATION, message, None)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Internal server error",
            None,
        )
        .with_detail(detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| self.message.to_string());
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.into_owned(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, diagnostic),
        )
        .attach(&mut response);
        response
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => ApiError::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint),
            ),
            RepoError::NotFound => ApiError::not_found("resource not found"),
            RepoError::InvalidInput { message } => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(message),
            ),
            RepoError::Integrity { message } => ApiError::new(
                StatusCode::CONFLICT,
                codes::INTEGRITY,
                "Integrity constraint violated",
                None,
            )
            .with_detail(message),
            RepoError::Timeout => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                None,
            ),
            RepoError::Persistence(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Internal server error",
                None,
            )
            .with_detail(message),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity } => {
                ApiError::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, entity, None)
            }
            DomainError::Validation { message } => ApiError::validation(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::validation("Username and password are required")
            }
            AuthError::InvalidCredentials => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::INVALID_CREDENTIALS,
                "Invalid credentials",
                None,
            ),
            AuthError::MissingToken => ApiError::unauthorized("Unauthorized"),
            AuthError::Token(TokenError::Expired) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::TOKEN_EXPIRED,
                "Token expired",
                None,
            ),
            AuthError::Token(TokenError::Invalid(inner)) => {
                ApiError::unauthorized("Invalid token").with_detail(inner.to_string())
            }
            // Store failures on the auth paths stay opaque.
            other @ (AuthError::Token(TokenError::Signing(_))
            | AuthError::Password(_)
            | AuthError::Repo(_)
            | AuthError::Blocking(_)) => ApiError::internal(other.to_string()),
        }
    }
}

impl From<CommentError> for ApiError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::Validation(message) => ApiError::validation(message),
            CommentError::UnknownPost(id) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::UNKNOWN_POST,
                "Post does not exist",
                Some(format!("no post with id {id}")),
            ),
            CommentError::Repo(repo) => repo.into(),
        }
    }
}

impl From<NewsletterError> for ApiError {
    fn from(err: NewsletterError) -> Self {
        match err {
            NewsletterError::MissingEmail => ApiError::validation("Email is required"),
            NewsletterError::AlreadySubscribed => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::ALREADY_SUBSCRIBED,
                "Already subscribed!",
                None,
            ),
            NewsletterError::Repo(repo) => repo.into(),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Validation(message) => ApiError::validation(message),
            PostError::NotFound => ApiError::not_found("Post not found"),
            PostError::Slug(slug) => ApiError::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Could not derive a unique slug",
                Some(slug.to_string()),
            ),
            PostError::Repo(repo) => repo.into(),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(message) => ApiError::validation(message),
            GenerationError::Completion(CompletionError::NotConfigured) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::UPSTREAM,
                "AI generation is not configured",
                None,
            ),
            GenerationError::Completion(inner) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::UPSTREAM,
                "Failed to generate content",
                None,
            )
            .with_detail(inner.to_string()),
            GenerationError::Repo(repo) => repo.into(),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Repo(repo) => repo.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_and_wrong_password_map_identically() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), codes::INVALID_CREDENTIALS);
    }

    #[test]
    fn persistence_detail_stays_out_of_the_body() {
        let err = ApiError::from(RepoError::Persistence("relation posts missing".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages[0].contains("relation posts missing"));
    }

    #[test]
    fn upstream_failures_are_500() {
        let err = ApiError::from(GenerationError::Completion(CompletionError::Upstream {
            status: 429,
            body: "slow down".into(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), codes::UPSTREAM);
    }

    #[test]
    fn already_subscribed_is_a_client_error() {
        let err = ApiError::from(NewsletterError::AlreadySubscribed);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), codes::ALREADY_SUBSCRIBED);
    }
}
