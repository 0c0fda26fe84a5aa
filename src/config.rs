//! Engine configuration surface.
//!
//! Options can be built in code or loaded from an optional `.i18n.json`
//! file next to the application. Validation collects every problem at
//! once; a misconfigured engine must fail construction instead of
//! running degraded.

use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

/// File name of the optional JSON configuration.
const CONFIG_FILE_NAME: &str = ".i18n.json";

/// Fallback locale pair used when no locales are configured.
const DEFAULT_LOCALE: (&str, &str) = ("en-US", "English");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "localeNames")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered, one-per-line rendering of collected validation errors.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Options for constructing the translation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nOptions {
    /// Directory containing the translation files.
    pub directory: String,

    /// Supported locale tags, first is the fallback.
    pub locales: Vec<String>,
    /// Human-readable display names, parallel to `locales`.
    pub locale_names: Vec<String>,

    /// Query parameter carrying a locale override.
    pub query_name: String,
    /// Cookie carrying a locale override.
    pub cookie_name: String,
}

impl Default for I18nOptions {
    fn default() -> Self {
        Self {
            directory: "locales".to_string(),
            locales: Vec::new(),
            locale_names: Vec::new(),
            query_name: "locale".to_string(),
            cookie_name: "locale".to_string(),
        }
    }
}

impl I18nOptions {
    /// # Errors
    /// - `locales` and `localeNames` differ in length
    /// - A locale tag is not a valid language identifier
    /// - `directory`, `queryName` or `cookieName` is empty
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.directory.is_empty() {
            errors.push(ValidationError::new(
                "directory",
                "The directory cannot be empty. Remove the field to use the default \"locales\"",
            ));
        }

        if self.locales.len() != self.locale_names.len() {
            errors.push(ValidationError::new(
                "localeNames",
                format!(
                    "Expected one display name per locale, got {} locales and {} names",
                    self.locales.len(),
                    self.locale_names.len()
                ),
            ));
        }

        for (index, locale) in self.locales.iter().enumerate() {
            if let Err(e) = locale.parse::<LanguageIdentifier>() {
                errors.push(ValidationError::new(
                    format!("locales[{index}]"),
                    format!("Invalid locale tag '{locale}': {e:?}"),
                ));
            }
        }

        if self.query_name.is_empty() {
            errors.push(ValidationError::new(
                "queryName",
                "The name cannot be empty. Remove the field to use the default \"locale\"",
            ));
        }

        if self.cookie_name.is_empty() {
            errors.push(ValidationError::new(
                "cookieName",
                "The name cannot be empty. Remove the field to use the default \"locale\"",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Supported locale tags and display names, with the default pair
    /// substituted when none are configured.
    ///
    /// Call after [`validate`](Self::validate); the lists are guaranteed
    /// parallel at that point.
    #[must_use]
    pub fn locales_with_names(&self) -> (Vec<String>, Vec<String>) {
        if self.locales.is_empty() {
            let (locale, name) = DEFAULT_LOCALE;
            (vec![locale.to_string()], vec![name.to_string()])
        } else {
            (self.locales.clone(), self.locale_names.clone())
        }
    }
}

/// アプリケーションルートから設定を読み込む
///
/// `.i18n.json` ファイルを探して読み込む
///
/// # Returns
/// - `Ok(Some(options))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub fn load_from_root(root: &Path) -> Result<Option<I18nOptions>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let options: I18nOptions = serde_json::from_str(&content)?;

    Ok(Some(options))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn validate_default_options() {
        let options = I18nOptions::default();

        assert_that!(options.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_options() {
        let json = r#"{"locales": ["en-US", "zh-CN"], "localeNames": ["English", "简体中文"]}"#;

        let options: I18nOptions = serde_json::from_str(json).unwrap();

        assert_that!(options.directory, eq("locales"));
        assert_that!(options.query_name, eq("locale"));
        assert_that!(options.cookie_name, eq("locale"));
        assert_that!(options.locales, len(eq(2)));
    }

    #[rstest]
    fn deserialize_empty_options() {
        let json = "{}";

        let options: I18nOptions = serde_json::from_str(json).unwrap();

        assert_that!(options.directory, eq("locales"));
        assert_that!(options.locales, is_empty());
        assert_that!(options.locale_names, is_empty());
    }

    #[rstest]
    fn validate_mismatched_name_lengths() {
        let options = I18nOptions {
            locales: vec!["en-US".to_string(), "zh-CN".to_string()],
            locale_names: vec!["English".to_string()],
            ..I18nOptions::default()
        };

        let result = options.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("localeNames")),
                field!(ValidationError.message, contains_substring("2 locales and 1 names"))
            ]])
        );
    }

    #[rstest]
    fn validate_invalid_locale_tag() {
        let options = I18nOptions {
            locales: vec!["en-US".to_string(), "not a tag".to_string()],
            locale_names: vec!["English".to_string(), "Broken".to_string()],
            ..I18nOptions::default()
        };

        let result = options.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq("locales[1]")),
                field!(ValidationError.message, contains_substring("Invalid locale tag"))
            ]])
        );
    }

    #[rstest]
    fn validate_empty_directory() {
        let options = I18nOptions { directory: String::new(), ..I18nOptions::default() };

        let result = options.validate();

        assert_that!(result, err(elements_are![field!(ValidationError.field_path, eq("directory"))]));
    }

    #[rstest]
    fn validate_empty_override_names() {
        let options = I18nOptions {
            query_name: String::new(),
            cookie_name: String::new(),
            ..I18nOptions::default()
        };

        let result = options.validate();

        assert_that!(
            result,
            err(elements_are![
                field!(ValidationError.field_path, eq("queryName")),
                field!(ValidationError.field_path, eq("cookieName"))
            ])
        );
    }

    #[rstest]
    fn locales_with_names_substitutes_default() {
        let options = I18nOptions::default();

        let (locales, names) = options.locales_with_names();

        assert_that!(locales, elements_are![eq("en-US")]);
        assert_that!(names, elements_are![eq("English")]);
    }

    #[rstest]
    fn locales_with_names_keeps_configured_lists() {
        let options = I18nOptions {
            locales: vec!["zh-CN".to_string()],
            locale_names: vec!["简体中文".to_string()],
            ..I18nOptions::default()
        };

        let (locales, names) = options.locales_with_names();

        assert_that!(locales, elements_are![eq("zh-CN")]);
        assert_that!(names, elements_are![eq("简体中文")]);
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let options = I18nOptions {
            directory: String::new(),
            query_name: String::new(),
            ..I18nOptions::default()
        };

        let errors = options.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let message = format!("{config_error}");
        assert_that!(message, contains_substring("Configuration validation failed"));
        assert_that!(message, contains_substring("1. directory"));
        assert_that!(message, contains_substring("2. queryName"));
    }

    /// `load_from_root`: 設定ファイルが存在する場合
    #[rstest]
    fn load_from_root_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"directory": "i18n"}"#;
        fs::write(temp_dir.path().join(".i18n.json"), config_content).unwrap();

        let result = load_from_root(temp_dir.path());

        assert_that!(result.unwrap(), some(field!(I18nOptions.directory, eq("i18n"))));
    }

    /// `load_from_root`: 設定ファイルが存在しない場合
    #[rstest]
    fn load_from_root_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_root(temp_dir.path());

        assert_that!(result.unwrap(), none());
    }

    /// `load_from_root`: JSON パースエラー
    #[rstest]
    fn load_from_root_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".i18n.json"), "invalid json").unwrap();

        let result = load_from_root(temp_dir.path());

        assert_that!(result, err(anything()));
    }
}
