use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{NewsletterRepo, RepoError};

pub(crate) const METRIC_NEWSLETTER_TOTAL: &str = "lekha_newsletter_subscribe_total";

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("email is required")]
    MissingEmail,
    #[error("email is already subscribed")]
    AlreadySubscribed,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    Reactivated,
}

impl SubscribeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubscribeOutcome::Subscribed => "Successfully subscribed!",
            SubscribeOutcome::Reactivated => "Subscription reactivated!",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SubscribeOutcome::Subscribed => "subscribed",
            SubscribeOutcome::Reactivated => "reactivated",
        }
    }
}

#[derive(Clone)]
pub struct NewsletterService {
    repo: Arc<dyn NewsletterRepo>,
}

impl NewsletterService {
    pub fn new(repo: Arc<dyn NewsletterRepo>) -> Self {
        Self { repo }
    }

    /// Subscribe a new address or reactivate a lapsed one.
    ///
    /// A reactivation keeps the stored name unless a non-empty one is supplied.
    pub async fn subscribe(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<SubscribeOutcome, NewsletterError> {
        let email = email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(NewsletterError::MissingEmail)?;
        let name = name.map(str::trim).filter(|name| !name.is_empty());

        let result = self.subscribe_inner(email, name).await;
        let label = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(NewsletterError::AlreadySubscribed) => "already_subscribed",
            Err(_) => "error",
        };
        counter!(METRIC_NEWSLETTER_TOTAL, "outcome" => label).increment(1);
        result
    }

    async fn subscribe_inner(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<SubscribeOutcome, NewsletterError> {
        match self.repo.find_by_email(email).await? {
            None => match self.repo.create_subscription(email, name).await {
                Ok(record) => {
                    info!(
                        target = "lekha::newsletter",
                        subscription_id = record.id,
                        "new newsletter subscription"
                    );
                    Ok(SubscribeOutcome::Subscribed)
                }
                Err(RepoError::Duplicate { .. }) => Err(NewsletterError::AlreadySubscribed),
                Err(other) => Err(other.into()),
            },
            Some(existing) if existing.is_active => Err(NewsletterError::AlreadySubscribed),
            Some(_) => match self.repo.reactivate(email, name).await? {
                Some(record) => {
                    info!(
                        target = "lekha::newsletter",
                        subscription_id = record.id,
                        "newsletter subscription reactivated"
                    );
                    Ok(SubscribeOutcome::Reactivated)
                }
                // lost a race with a concurrent reactivation
                None => Err(NewsletterError::AlreadySubscribed),
            },
        }
    }
}
