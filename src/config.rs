//! Import engine configuration.

use crate::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};

/// Settings that shape how bundles are validated and applied.
///
/// ```rust
/// use realm_import::ImportConfig;
///
/// let config = ImportConfig::from_json(r#"{"maxBundleItems": 500}"#).unwrap();
/// assert_eq!(config.max_bundle_items, Some(500));
/// assert!(config.lowercase_usernames);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportConfig {
    /// Upper bound on items across all kinds in one bundle.
    pub max_bundle_items: Option<usize>,
    /// Treat usernames case-insensitively by storing them lower-cased.
    pub lowercase_usernames: bool,
    /// Deliver admin events to registered listeners after a commit.
    pub emit_admin_events: bool,
    /// Attach the stored representation to admin events.
    pub include_representation: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bundle_items: None,
            lowercase_usernames: true,
            emit_admin_events: true,
            include_representation: false,
        }
    }
}

impl ImportConfig {
    /// Parse and validate a configuration document.
    pub fn from_json(input: &str) -> ImportResult<Self> {
        let config: ImportConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_bundle_items(mut self, limit: usize) -> Self {
        self.max_bundle_items = Some(limit);
        self
    }

    pub fn with_lowercase_usernames(mut self, enabled: bool) -> Self {
        self.lowercase_usernames = enabled;
        self
    }

    pub fn with_admin_events(mut self, enabled: bool) -> Self {
        self.emit_admin_events = enabled;
        self
    }

    pub fn with_representation_in_events(mut self, enabled: bool) -> Self {
        self.include_representation = enabled;
        self
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.max_bundle_items == Some(0) {
            return Err(ImportError::invalid_request(
                "maxBundleItems must be greater than zero",
            ));
        }
        Ok(())
    }
}
