use crate::tabular::WideningPolicy;
use crate::translation::{Category, Level};
use crate::utils::errors::{Result, TranslatorError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub translation: TranslationDefaults,
    pub sheets: SheetsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Environment variable holding the Gemini API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationDefaults {
    pub category: Category,
    pub level: Level,
    pub source_column: String,
    pub target_column: String,
    /// Minimum spacing between two translation calls.
    pub rate_limit_ms: u64,
    pub widening: WideningPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub api_base: String,
    pub export_base: String,
    /// Environment variable holding an OAuth access token with spreadsheet scope.
    pub access_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub sanitize_formulas: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "sheet-translator".to_string(),
            bind_addr: "0.0.0.0".to_string(),
            port: 9527,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_seconds: 120,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        Self {
            category: Category::DailyLife,
            level: Level::Beginner,
            source_column: "D".to_string(),
            target_column: "E".to_string(),
            rate_limit_ms: 500,
            widening: WideningPolicy::PadToTarget,
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com".to_string(),
            export_base: "https://docs.google.com".to_string(),
            access_token_env: "GOOGLE_SHEETS_TOKEN".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            sanitize_formulas: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslatorError::ConfigError(format!("{}: {}", path, e)))?;
        toml::from_str(&content).map_err(|e| TranslatorError::ConfigError(e.to_string()))
    }

    pub fn load_or_default(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Falling back to default configuration");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Prefers an explicitly supplied key, then the configured environment variable.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        let key = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .unwrap_or_default();

        if key.trim().is_empty() {
            return Err(TranslatorError::ConfigError(format!(
                "API key missing: pass --api-key or set {}",
                self.api_key_env
            )));
        }
        Ok(key)
    }
}

impl TranslationDefaults {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

impl SheetsConfig {
    pub fn access_token(&self) -> Option<String> {
        std::env::var(&self.access_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [translation]
            category = "Business"
            level = "advanced"
            rate_limit_ms = 0

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.translation.category, Category::Business);
        assert_eq!(config.translation.level, Level::Advanced);
        assert_eq!(config.translation.rate_limit(), Duration::ZERO);
        assert_eq!(config.translation.source_column, "D");
        assert_eq!(config.api.model, "gemini-2.5-flash");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config: AppConfig = toml::from_str(include_str!("../../config.toml")).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(config.translation.category, defaults.translation.category);
        assert_eq!(config.translation.level, defaults.translation.level);
        assert_eq!(config.translation.widening, defaults.translation.widening);
        assert_eq!(config.api.endpoint, defaults.api.endpoint);
        assert_eq!(config.sheets.api_base, defaults.sheets.api_base);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = AppConfig::load_or_default(Some("/definitely/not/here.toml"));
        assert_eq!(config.server.port, 9527);
        assert_eq!(config.translation.widening, WideningPolicy::PadToTarget);
    }

    #[test]
    fn explicit_api_key_wins() {
        let api = ApiConfig {
            api_key_env: "SHEET_TRANSLATOR_TEST_UNSET_KEY".to_string(),
            ..ApiConfig::default()
        };
        assert_eq!(api.resolve_api_key(Some("AIza-test")).unwrap(), "AIza-test");
        assert!(matches!(
            api.resolve_api_key(None),
            Err(TranslatorError::ConfigError(_))
        ));
        assert!(api.resolve_api_key(Some("   ")).is_err());
    }
}
