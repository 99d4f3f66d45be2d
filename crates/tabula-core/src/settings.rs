//! Translation settings.
//!
//! Settings can be built in code or loaded from JSON:
//!
//! ```
//! use tabula_core::Settings;
//!
//! let settings = Settings::from_json(r#"{ "date_format": "%d.%m.%Y" }"#).unwrap();
//! assert_eq!(settings.date_format, "%d.%m.%Y");
//! assert_eq!(settings.datetime_format, "%Y-%m-%d %H:%M:%S");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Options shared by every translation performed with one translator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `chrono` format for date anchors
    pub date_format: String,
    /// `chrono` format for date-time anchors
    pub datetime_format: String,
    /// Characters that separate path segments
    pub path_separators: Vec<char>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            path_separators: vec!['.', '/'],
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date anchor format.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the date-time anchor format.
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    /// Set the path separators.
    pub fn path_separators(mut self, separators: impl IntoIterator<Item = char>) -> Self {
        self.path_separators = separators.into_iter().collect();
        self
    }

    /// Load settings from a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json).map_err(|e| Error::Serde(e.to_string()))?;
        settings.validate()?;
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.date_format.trim().is_empty() || self.datetime_format.trim().is_empty() {
            return Err(ConfigError::new("temporal anchor formats cannot be empty").into());
        }
        if self.path_separators.is_empty() {
            return Err(ConfigError::new("at least one path separator is required").into());
        }
        if let Some(c) = self
            .path_separators
            .iter()
            .find(|c| c.is_alphanumeric() || **c == '_')
        {
            return Err(
                ConfigError::new(format!("'{c}' cannot separate path segments")).into(),
            );
        }
        Ok(())
    }
}
