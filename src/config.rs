use serde::{Deserialize, Serialize};

use crate::pagination::{DEFAULT_PAGE, DEFAULT_SIZE};

/// Defaults and limits applied to every page request.
///
/// Deserializes with per-field defaults, so a host can embed it in its own
/// configuration file and override only what it needs:
///
/// ```toml
/// [pagination]
/// default_size = 50
/// max_size = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page used when a request has none
    pub default_page: u64,
    /// Page size used when a request has none
    pub default_size: u64,
    /// Upper bound for requested page sizes; larger requests are clamped
    pub max_size: Option<u64>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: DEFAULT_PAGE,
            default_size: DEFAULT_SIZE,
            max_size: None,
        }
    }
}

impl PaginationConfig {
    #[must_use]
    pub fn with_default_size(mut self, size: u64) -> Self {
        self.default_size = size;
        self
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PaginationConfig::default();
        assert_eq!(config.default_page, 1);
        assert_eq!(config.default_size, 20);
        assert_eq!(config.max_size, None);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: PaginationConfig = serde_json::from_str(r#"{"max_size": 100}"#).unwrap();
        assert_eq!(config.default_size, 20);
        assert_eq!(config.max_size, Some(100));
    }

    #[test]
    fn test_builders() {
        let config = PaginationConfig::default()
            .with_default_size(50)
            .with_max_size(200);
        assert_eq!(config.default_size, 50);
        assert_eq!(config.max_size, Some(200));
    }
}
