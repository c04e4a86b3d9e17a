#![forbid(unsafe_code)]

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_PAGE_SIZE: usize = 2000;
pub const DEFAULT_MAX_FAN_OUT: usize = 2000;
pub const DEFAULT_CLOCK_SKEW_MS: i64 = 60_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Upper bound for any single page read from the store.
    pub max_page_size: usize,
    /// Largest subtree (descendant count) a delete or reparent will touch.
    pub max_fan_out: usize,
    /// How far ahead of the local clock a write timestamp may be.
    pub clock_skew_ms: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            max_fan_out: DEFAULT_MAX_FAN_OUT,
            clock_skew_ms: DEFAULT_CLOCK_SKEW_MS,
        }
    }
}

impl TreeConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_page_size == 0 {
            return Err(StoreError::InvalidInput("max_page_size must be greater than 0"));
        }
        if self.max_fan_out == 0 {
            return Err(StoreError::InvalidInput("max_fan_out must be greater than 0"));
        }
        if self.clock_skew_ms < 0 {
            return Err(StoreError::InvalidInput("clock_skew_ms must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = TreeConfig::from_json_str(r#"{"max_fan_out": 50}"#).unwrap();
        assert_eq!(config.max_fan_out, 50);
        assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(config.clock_skew_ms, DEFAULT_CLOCK_SKEW_MS);
    }

    #[test]
    fn rejects_unknown_fields_and_zero_sizes() {
        assert!(matches!(
            TreeConfig::from_json_str(r#"{"max_pages": 1}"#).unwrap_err(),
            StoreError::Json(_)
        ));
        assert!(matches!(
            TreeConfig::from_json_str(r#"{"max_page_size": 0}"#).unwrap_err(),
            StoreError::InvalidInput(_)
        ));
    }
}
