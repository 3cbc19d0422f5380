//! AI-assisted drafting, the topic bot, and the visitor chat assistant.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};
use tracing::{info, warn};

use crate::application::completion::{
    CompletionClient, CompletionError, CompletionRequest, PromptMessage,
};
use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError};
use crate::domain::posts::{cover_image_url, reading_time_minutes, truncated_excerpt};
use crate::domain::slug::timestamped_slug;

pub(crate) const METRIC_GENERATED_POSTS_TOTAL: &str = "lekha_generated_posts_total";
pub(crate) const METRIC_COMPLETION_MS: &str = "lekha_completion_ms";

pub const BOT_TOPICS: [&str; 10] = [
    "AI and Machine Learning",
    "Web Development Trends",
    "Digital Marketing",
    "Remote Work Tips",
    "Health and Wellness",
    "Productivity Hacks",
    "Technology Innovations",
    "Sustainable Living",
    "Personal Finance",
    "Career Development",
];

const WRITER_SYSTEM_PROMPT: &str = "You are a professional blog writer. Generate engaging, SEO-friendly blog posts with proper HTML formatting.";
const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for a blog website. Answer questions about blog posts, help visitors find information, and provide general assistance. Be friendly, concise, and helpful.";

const DRAFT_APP_TITLE: &str = "Blog AI Generator";
const BOT_APP_TITLE: &str = "Blog Bot Generator";
const CHAT_APP_TITLE: &str = "Blog Chat Assistant";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Post-shaped draft returned to the editor; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
struct DraftPayload {
    title: Option<String>,
    excerpt: Option<String>,
    content: Option<String>,
}

#[derive(Clone)]
pub struct GenerationService {
    completion: Arc<dyn CompletionClient>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl GenerationService {
    pub fn new(completion: Arc<dyn CompletionClient>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { completion, writer }
    }

    pub async fn draft_from_idea(&self, idea: Option<&str>) -> Result<GeneratedDraft, GenerationError> {
        let idea = idea
            .map(str::trim)
            .filter(|idea| !idea.is_empty())
            .ok_or(GenerationError::Validation("idea is required"))?;

        let reply = self
            .call(CompletionRequest {
                app_title: DRAFT_APP_TITLE,
                messages: vec![
                    PromptMessage::system(format!(
                        "{WRITER_SYSTEM_PROMPT} Return JSON with title, excerpt, and content fields."
                    )),
                    PromptMessage::user(format!(
                        "Write a blog post about: {idea}. Return as JSON with fields: title (string), excerpt (string, 150-200 chars), content (HTML formatted blog post with h2, h3, p, ul, li tags). Make it informative and engaging."
                    )),
                ],
                temperature: 0.7,
                max_tokens: 2000,
            })
            .await?;

        let draft = normalize_draft(idea, &reply);
        counter!(METRIC_GENERATED_POSTS_TOTAL, "mode" => "draft").increment(1);
        Ok(draft)
    }

    /// Pick a topic, generate content for it, and publish the result.
    pub async fn publish_bot_post(&self, author_id: i64) -> Result<BotPost, GenerationError> {
        let topic = pick_topic();
        let now = OffsetDateTime::now_utc();
        let date = now
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        let idea = format!("{topic} - Latest Insights {date}");

        let content = self
            .call(CompletionRequest {
                app_title: BOT_APP_TITLE,
                messages: vec![
                    PromptMessage::system(WRITER_SYSTEM_PROMPT),
                    PromptMessage::user(format!(
                        "Write a unique and informative blog post about: {idea}. Make it current, relevant, and engaging. Format with HTML tags (h2, h3, p, ul, li). Include at least 500 words."
                    )),
                ],
                temperature: 0.8,
                max_tokens: 2500,
            })
            .await?;

        let title = format!("{topic}: Essential Guide for {}", now.year());
        let excerpt = format!(
            "Discover the latest insights and trends in {topic}. This comprehensive guide covers everything you need to know."
        );
        let slug = timestamped_slug(&title, now.unix_timestamp_nanos() / 1_000_000);
        let reading_time = reading_time_minutes(&content);

        let record = self
            .writer
            .create_post(CreatePostParams {
                title,
                slug,
                content,
                excerpt: Some(excerpt),
                cover_image: Some(cover_image_url(topic)),
                published: true,
                reading_time,
                author_id: Some(author_id),
            })
            .await?;

        counter!(METRIC_GENERATED_POSTS_TOTAL, "mode" => "bot").increment(1);
        info!(
            target = "lekha::generation",
            post_id = record.id,
            slug = %record.slug,
            topic,
            "bot post published"
        );
        Ok(BotPost {
            id: record.id,
            title: record.title,
            slug: record.slug,
        })
    }

    pub async fn chat(&self, message: Option<&str>) -> Result<String, GenerationError> {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .ok_or(GenerationError::Validation("message is required"))?;

        let reply = self
            .call(CompletionRequest {
                app_title: CHAT_APP_TITLE,
                messages: vec![
                    PromptMessage::system(CHAT_SYSTEM_PROMPT),
                    PromptMessage::user(message),
                ],
                temperature: 0.7,
                max_tokens: 500,
            })
            .await?;
        Ok(reply)
    }

    async fn call(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let app_title = request.app_title;
        let started = Instant::now();
        let result = self.completion.complete(request).await;
        histogram!(METRIC_COMPLETION_MS, "app" => app_title)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        if let Err(err) = &result {
            warn!(
                target = "lekha::generation",
                app = app_title,
                error = %err,
                "completion request failed"
            );
        }
        result
    }
}

fn pick_topic() -> &'static str {
    BOT_TOPICS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BOT_TOPICS[0])
}

/// Turn a provider reply into a draft, tolerating non-JSON text.
fn normalize_draft(idea: &str, reply: &str) -> GeneratedDraft {
    let payload = serde_json::from_str::<DraftPayload>(strip_code_fence(reply)).unwrap_or_else(|_| {
        DraftPayload {
            title: Some(idea.to_string()),
            excerpt: Some(truncated_excerpt(reply)),
            content: Some(reply.to_string()),
        }
    });

    let keyword = idea.split_whitespace().next().unwrap_or(idea);
    GeneratedDraft {
        title: present(payload.title).unwrap_or_else(|| idea.to_string()),
        excerpt: present(payload.excerpt).unwrap_or_default(),
        content: present(payload.content).unwrap_or_default(),
        cover_image: cover_image_url(keyword),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Remove a surrounding Markdown code fence (with or without a language tag).
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((tag, inner)) if !tag.contains('{') => inner.trim(),
        _ => body.trim(),
    }
}
