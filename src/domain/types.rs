//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::domain::error::DomainError;

/// Reporting window accepted by the analytics rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalyticsRange {
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "90days")]
    NinetyDays,
    #[serde(rename = "all")]
    All,
}

impl AnalyticsRange {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalyticsRange::SevenDays => "7days",
            AnalyticsRange::ThirtyDays => "30days",
            AnalyticsRange::NinetyDays => "90days",
            AnalyticsRange::All => "all",
        }
    }

    /// Inclusive lower bound for the window, `None` when unbounded.
    pub fn since(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        let days = match self {
            AnalyticsRange::SevenDays => 7,
            AnalyticsRange::ThirtyDays => 30,
            AnalyticsRange::NinetyDays => 90,
            AnalyticsRange::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

impl FromStr for AnalyticsRange {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "7days" => Ok(AnalyticsRange::SevenDays),
            "30days" => Ok(AnalyticsRange::ThirtyDays),
            "90days" => Ok(AnalyticsRange::NinetyDays),
            "all" => Ok(AnalyticsRange::All),
            other => Err(DomainError::validation(format!(
                "unknown analytics range `{other}`"
            ))),
        }
    }
}

impl fmt::Display for AnalyticsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Post,
    Comment,
    Newsletter,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Post => "post",
            ActivityKind::Comment => "comment",
            ActivityKind::Newsletter => "newsletter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_known_ranges_and_rejects_others() {
        assert_eq!("30days".parse(), Ok(AnalyticsRange::ThirtyDays));
        assert_eq!("all".parse(), Ok(AnalyticsRange::All));
        assert!(matches!(
            "1year".parse::<AnalyticsRange>(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn since_is_unbounded_for_all() {
        let now = datetime!(2025-03-10 12:00 UTC);
        assert_eq!(AnalyticsRange::All.since(now), None);
        assert_eq!(
            AnalyticsRange::SevenDays.since(now),
            Some(datetime!(2025-03-03 12:00 UTC))
        );
    }
}
