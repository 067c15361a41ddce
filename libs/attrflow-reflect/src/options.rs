use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Conversion policy. Every flag defaults to `false` (strict).
///
/// Can be embedded in a TOML configuration:
///
/// ```toml
/// unhandled_null_as_empty = true
/// allow_rounding_numbers = false
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// A null value for a target that cannot hold null becomes the zero value.
    pub unhandled_null_as_empty: bool,

    /// An unknown value becomes the zero value instead of an error.
    pub unhandled_unknown_as_empty: bool,

    /// Numbers that lose precision are truncated toward zero instead of rejected.
    pub allow_rounding_numbers: bool,
}

impl Options {
    pub fn with_unhandled_null_as_empty(mut self, on: bool) -> Self {
        self.unhandled_null_as_empty = on;
        self
    }

    pub fn with_unhandled_unknown_as_empty(mut self, on: bool) -> Self {
        self.unhandled_unknown_as_empty = on;
        self
    }

    pub fn with_allow_rounding_numbers(mut self, on: bool) -> Self {
        self.allow_rounding_numbers = on;
        self
    }

    /// Load options from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse options from a TOML string. Missing keys keep their default.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_by_default() {
        let options = Options::default();
        assert!(!options.unhandled_null_as_empty);
        assert!(!options.unhandled_unknown_as_empty);
        assert!(!options.allow_rounding_numbers);
        assert_eq!(Options::parse("").unwrap(), options);
    }

    #[test]
    fn parse_partial_toml() {
        let options = Options::parse("allow_rounding_numbers = true\n").unwrap();
        assert_eq!(
            options,
            Options::default().with_allow_rounding_numbers(true)
        );
    }

    #[test]
    fn parse_rejects_wrong_type() {
        let err = Options::parse("unhandled_null_as_empty = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file() {
        let err = Options::load("/nonexistent/attrflow-options.toml").unwrap_err();
        assert!(err.to_string().contains("attrflow-options.toml"));
    }

    #[test]
    fn json_roundtrip() {
        let options = Options::default()
            .with_unhandled_null_as_empty(true)
            .with_unhandled_unknown_as_empty(true);
        let json = serde_json::to_string(&options).unwrap();
        let back: Options = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);

        let partial: Options = serde_json::from_str(r#"{"allow_rounding_numbers": true}"#).unwrap();
        assert!(partial.allow_rounding_numbers);
        assert!(!partial.unhandled_null_as_empty);
    }
}
