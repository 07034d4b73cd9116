#![forbid(unsafe_code)]

//! Adapter settings, loadable from TOML or JSON.
//!
//! ```rust,ignore
//! let settings = AdapterSettings::from_toml_file("browser.toml")?;
//! let settings = AdapterSettings::from_json_str(json)?.validated()?;
//! ```
//!
//! Every field has a default, so partial files are fine.

use std::path::Path;

use osr_engine::BrowserSettings;
use serde::{Deserialize, Serialize};

/// The engine refuses windowless frame rates above this.
pub const MAX_WINDOWLESS_FRAME_RATE: u32 = 60;

/// Configuration for one [`crate::BrowserAdapter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSettings {
    /// Name used in log records.
    pub name: String,
    /// Address loaded when the browser is created, unless navigation
    /// replaced it first.
    pub start_url: String,
    /// Request a transparent windowless surface.
    pub allows_transparency: bool,
    /// Forwarded verbatim with the create-browser command.
    pub browser: BrowserSettings,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            name: "browser".to_owned(),
            start_url: "about:blank".to_owned(),
            allows_transparency: false,
            browser: BrowserSettings::default(),
        }
    }
}

impl AdapterSettings {
    /// Load from a TOML string.
    #[cfg(feature = "settings-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        toml::from_str(s).map_err(SettingsError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "settings-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(s).map_err(SettingsError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Returns a list of validation errors. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_owned());
        }
        if self.start_url.trim().is_empty() {
            errors.push("start_url must not be empty".to_owned());
        }
        let rate = self.browser.windowless_frame_rate;
        if rate == 0 || rate > MAX_WINDOWLESS_FRAME_RATE {
            errors.push(format!(
                "browser.windowless_frame_rate must be in 1..={MAX_WINDOWLESS_FRAME_RATE}, got {rate}"
            ));
        }
        if let Some(encoding) = &self.browser.default_encoding
            && encoding.trim().is_empty()
        {
            errors.push("browser.default_encoding must not be blank".to_owned());
        }
        errors
    }

    /// `self` if [`Self::validate`] finds nothing.
    pub fn validated(self) -> Result<Self, SettingsError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(SettingsError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "settings-toml")]
    #[error("TOML parse error: {0}")]
    Toml(toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let settings = AdapterSettings::default();
        assert_eq!(settings.start_url, "about:blank");
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn json_partial_fills_defaults() {
        let settings = AdapterSettings::from_json_str(
            r#"{"name": "docs", "browser": {"windowless_frame_rate": 60}}"#,
        )
        .unwrap();
        assert_eq!(settings.name, "docs");
        assert_eq!(settings.start_url, "about:blank");
        assert_eq!(settings.browser.windowless_frame_rate, 60);
        assert!(settings.browser.javascript_enabled);
    }

    #[cfg(feature = "settings-toml")]
    #[test]
    fn toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("browser.toml");
        std::fs::write(
            &path,
            r#"
name = "help"
start_url = "app://help/index.html"
allows_transparency = true

[browser]
background_color = 0
"#,
        )
        .unwrap();

        let settings = AdapterSettings::from_toml_file(&path).unwrap();
        assert_eq!(settings.name, "help");
        assert!(settings.allows_transparency);
        assert_eq!(settings.browser.background_color, 0);
        assert_eq!(settings.browser.windowless_frame_rate, 30);
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut settings = AdapterSettings {
            name: " ".into(),
            ..AdapterSettings::default()
        };
        settings.browser.windowless_frame_rate = 0;
        settings.browser.default_encoding = Some(String::new());

        let errors = settings.validate();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            settings.validated(),
            Err(SettingsError::Validation(list)) if list.len() == 3
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AdapterSettings::from_json_file("/nonexistent/osr.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = AdapterSettings::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().starts_with("JSON parse error"));
    }
}
