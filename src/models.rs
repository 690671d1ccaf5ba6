use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::classifier::Classification;
use crate::utils::error::AppError;

/// Bookable state of one ticket category as read off the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Unknown,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Unavailable => write!(f, "unavailable"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of one category check within one poll cycle.
///
/// A failed fetch is carried as data (`status = Unknown` plus `failure`)
/// rather than as an error the caller has to intercept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub category: u32,
    pub status: Availability,
    pub evidence: Option<String>,
    pub failure: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn classified(category: u32, classification: Classification) -> Self {
        Self {
            category,
            status: classification.status,
            evidence: classification.evidence,
            failure: None,
            checked_at: Utc::now(),
        }
    }

    pub fn failed(category: u32, cause: &AppError) -> Self {
        Self {
            category,
            status: Availability::Unknown,
            evidence: None,
            failure: Some(cause.to_string()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == Availability::Available
    }
}

/// Rendered text of the monitored page, grabbed once per poll cycle.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub raw_text: String,
    pub screenshot_path: Option<PathBuf>,
}

impl PageSnapshot {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            screenshot_path: None,
        }
    }
}
