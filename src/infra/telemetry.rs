use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::{
    application::{
        auth::METRIC_LOGIN_TOTAL,
        comments::METRIC_COMMENTS_SUBMITTED_TOTAL,
        generation::{METRIC_COMPLETION_MS, METRIC_GENERATED_POSTS_TOTAL},
        newsletter::METRIC_NEWSLETTER_TOTAL,
    },
    config::{LogFormat, LoggingSettings},
};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_LOGIN_TOTAL,
            Unit::Count,
            "Admin login attempts, labelled by outcome."
        );
        describe_counter!(
            METRIC_COMMENTS_SUBMITTED_TOTAL,
            Unit::Count,
            "Reader comments accepted into the moderation queue."
        );
        describe_counter!(
            METRIC_NEWSLETTER_TOTAL,
            Unit::Count,
            "Newsletter subscription requests, labelled by outcome."
        );
        describe_counter!(
            METRIC_GENERATED_POSTS_TOTAL,
            Unit::Count,
            "Posts produced through the completion provider, labelled by mode."
        );
        describe_histogram!(
            METRIC_COMPLETION_MS,
            Unit::Milliseconds,
            "Completion provider round-trip latency in milliseconds."
        );
    });
}
