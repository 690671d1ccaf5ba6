use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::utils::error::{AppError, Result};

/// The listing watched by default.
pub const DEFAULT_URL: &str = "https://www.tripadvisor.com/AttractionProductReview-g190454-d19350909-Vienna_Vivaldi_s_The_Four_Seasons_Mozart_in_the_Musikverein-Vienna.html";

pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CATEGORIES: &str = "3,4";

/// Runtime configuration, built once at startup from CLI input and read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub target_url: String,
    /// Sorted ascending and deduplicated; cycle order is deterministic.
    pub categories: Vec<u32>,
    pub interval_secs: u64,
    pub page_timeout_secs: u64,
    pub visible: bool,
    pub debug: bool,
    pub single_shot: bool,
    pub chrome_path: Option<PathBuf>,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if Url::parse(&self.target_url).is_err() {
            return Err(AppError::Config(format!(
                "invalid target URL: {}",
                self.target_url
            )));
        }

        if self.categories.is_empty() {
            return Err(AppError::Config(
                "at least one category must be given".to_string(),
            ));
        }

        if self.interval_secs == 0 {
            return Err(AppError::Config(
                "check interval must be greater than 0".to_string(),
            ));
        }

        if self.page_timeout_secs == 0 {
            return Err(AppError::Config(
                "page timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse the `--categories` value ("3,4") into a sorted, deduplicated
    /// list of category numbers.
    pub fn parse_categories(raw: &str) -> Result<Vec<u32>> {
        let mut categories = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let category: u32 = part.parse().map_err(|_| {
                AppError::Config(format!("invalid category number: '{part}'"))
            })?;
            categories.push(category);
        }

        categories.sort_unstable();
        categories.dedup();
        Ok(categories)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            target_url: "https://example.com/listing".to_string(),
            categories: vec![3, 4],
            interval_secs: DEFAULT_INTERVAL_SECS,
            page_timeout_secs: 5,
            visible: false,
            debug: false,
            single_shot: true,
            chrome_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = MonitorConfig::for_tests();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.page_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = MonitorConfig::for_tests();
        config.target_url = "not-a-valid-url".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid target URL"));
    }

    #[test]
    fn test_empty_categories_rejected() {
        let mut config = MonitorConfig::for_tests();
        config.categories.clear();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least one category"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = MonitorConfig::for_tests();
        config.interval_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = MonitorConfig::for_tests();
        config.page_timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(MonitorConfig::parse_categories("3,4").unwrap(), vec![3, 4]);
        assert_eq!(
            MonitorConfig::parse_categories(" 4 , 3 ,3").unwrap(),
            vec![3, 4]
        );
        assert_eq!(MonitorConfig::parse_categories("12").unwrap(), vec![12]);
        assert_eq!(MonitorConfig::parse_categories("").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_parse_categories_rejects_garbage() {
        let result = MonitorConfig::parse_categories("3,premium");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("invalid category number: 'premium'"));
    }

    #[test]
    fn test_default_url_is_well_formed() {
        assert!(Url::parse(DEFAULT_URL).is_ok());
    }
}
