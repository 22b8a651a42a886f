//! Configuration management for the `InboundAI` service
//!
//! Handles loading configuration from a TOML file and `INBOUNDAI_` environment
//! variables, and validates every setting before the service starts.

use crate::InboundAiError;
use crate::models::YearMonth;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundAiConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Dataset locations
    pub data: DataConfig,
    /// External data API credentials and endpoints
    pub apis: ApisConfig,
    /// Language model endpoint
    pub llm: LlmConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Forecast model settings
    pub forecast: ForecastConfig,
    /// Planner page settings
    pub planner: PlannerConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request timeout, covers the slowest LLM call
    pub request_timeout_seconds: u64,
    /// Sessions untouched for this long are dropped
    pub session_idle_minutes: u64,
}

/// Dataset file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Observed monthly arrivals (2018-2024)
    pub history_path: PathBuf,
    /// History plus model output; regenerated from history when missing
    pub combined_path: PathBuf,
    /// Seasonal growth rates per country
    pub seasonal_growth_path: PathBuf,
    /// Language and travel preference per country
    pub travel_preference_path: PathBuf,
}

/// Credentials and endpoints for tourism, map and blog search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApisConfig {
    pub tour_service_key: Option<String>,
    pub tour_base_url: String,
    pub kakao_rest_key: Option<String>,
    pub kakao_base_url: String,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub naver_base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures
    pub max_retries: u32,
}

/// Hosted language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory location
    pub location: String,
    pub festival_ttl_minutes: u32,
    pub attraction_ttl_hours: u32,
    pub blog_ttl_minutes: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// Forecast model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Country forecast with the cyclic regressor instead of the seasonal model
    pub outlier_country: String,
    pub start_year: i32,
    pub start_month: u32,
    pub horizon_months: u32,
    /// Years dropped from training (pandemic window)
    pub excluded_years: Vec<i32>,
    /// Logistic cap as a multiple of the historical maximum
    pub cap_ratio: f64,
    /// Logistic floor as a multiple of the latest training year's minimum
    pub floor_factor: f64,
    pub min_seasonal_cycles: usize,
    pub boundary_blend_months: u32,
    /// Weight growth per training year for the cyclic regressor
    pub recency_weight: f64,
}

/// Planner page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minimum expected arrivals for the "high visitor" table
    pub visitor_threshold: u64,
    /// Months before and after the selected month in trend charts
    pub trend_window_months: u32,
    /// Places requested per map search (the API caps this at 15)
    pub spot_display: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 120,
            session_idle_minutes: 60,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/visitors_history.csv"),
            combined_path: PathBuf::from("data/df_total.csv"),
            seasonal_growth_path: PathBuf::from("data/df_seasonal_growth.csv"),
            travel_preference_path: PathBuf::from("data/example_travel_preference.csv"),
        }
    }
}

impl Default for ApisConfig {
    fn default() -> Self {
        Self {
            tour_service_key: None,
            tour_base_url: "http://apis.data.go.kr/B551011/KorService1".to_string(),
            kakao_rest_key: None,
            kakao_base_url: "https://dapi.kakao.com/v2/local".to_string(),
            naver_client_id: None,
            naver_client_secret: None,
            naver_base_url: "https://openapi.naver.com/v1/search".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://router.huggingface.co/hf-inference/models".to_string(),
            model: "google/gemma-2-9b-it".to_string(),
            max_tokens: 1024,
            timeout_seconds: 90,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_cache_location(),
            festival_ttl_minutes: 60,
            attraction_ttl_hours: 24,
            blog_ttl_minutes: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            outlier_country: "중국".to_string(),
            start_year: 2025,
            start_month: 1,
            horizon_months: 24,
            excluded_years: vec![2020, 2021, 2022],
            cap_ratio: 1.1,
            floor_factor: 1.5,
            min_seasonal_cycles: 2,
            boundary_blend_months: 1,
            recency_weight: 2.0,
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            visitor_threshold: 30_000,
            trend_window_months: 3,
            spot_display: 10,
        }
    }
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("inboundai").to_string_lossy().to_string())
        .unwrap_or_else(|| ".cache/inboundai".to_string())
}

impl ForecastConfig {
    /// First forecast month
    #[must_use]
    pub fn start(&self) -> YearMonth {
        YearMonth::new(self.start_year, self.start_month)
    }

    /// Last forecast month (inclusive)
    #[must_use]
    pub fn end(&self) -> YearMonth {
        self.start()
            .offset(i32::try_from(self.horizon_months).unwrap_or(i32::MAX) - 1)
    }
}

impl InboundAiConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // INBOUNDAI_LLM__API_KEY -> llm.api_key
        builder = builder.add_source(
            Environment::with_prefix("INBOUNDAI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: InboundAiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inboundai").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Keys are optional, but a configured key must not be blank
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("apis.tour_service_key", &self.apis.tour_service_key),
            ("apis.kakao_rest_key", &self.apis.kakao_rest_key),
            ("apis.naver_client_id", &self.apis.naver_client_id),
            ("apis.naver_client_secret", &self.apis.naver_client_secret),
            ("llm.api_key", &self.llm.api_key),
        ];

        for (name, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(InboundAiError::config(format!(
                        "{name} cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.session_idle_minutes == 0 || self.server.session_idle_minutes > 1440 {
            return Err(InboundAiError::config(
                "Session idle timeout must be between 1 and 1440 minutes",
            )
            .into());
        }

        if self.apis.timeout_seconds == 0 || self.apis.timeout_seconds > 300 {
            return Err(
                InboundAiError::config("API timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.apis.max_retries > 10 {
            return Err(InboundAiError::config("API max retries cannot exceed 10").into());
        }

        if self.llm.max_tokens == 0 || self.llm.max_tokens > 8192 {
            return Err(InboundAiError::config("LLM max tokens must be between 1 and 8192").into());
        }

        if self.cache.attraction_ttl_hours > 168 {
            return Err(
                InboundAiError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        let forecast = &self.forecast;
        if !(1..=12).contains(&forecast.start_month) {
            return Err(InboundAiError::config("Forecast start month must be 1-12").into());
        }

        if forecast.horizon_months == 0 || forecast.horizon_months > 120 {
            return Err(
                InboundAiError::config("Forecast horizon must be between 1 and 120 months").into(),
            );
        }

        if forecast.cap_ratio < 1.0 {
            return Err(InboundAiError::config("Forecast cap ratio must be at least 1.0").into());
        }

        if forecast.floor_factor < 0.0 {
            return Err(InboundAiError::config("Forecast floor factor cannot be negative").into());
        }

        if forecast.min_seasonal_cycles == 0 {
            return Err(
                InboundAiError::config("Forecast needs at least one seasonal cycle").into(),
            );
        }

        if forecast.recency_weight < 1.0 {
            return Err(
                InboundAiError::config("Recency weight must be at least 1.0").into(),
            );
        }

        if self.planner.spot_display == 0 || self.planner.spot_display > 15 {
            return Err(
                InboundAiError::config("Spot display count must be between 1 and 15").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(InboundAiError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(InboundAiError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("apis.tour_base_url", &self.apis.tour_base_url),
            ("apis.kakao_base_url", &self.apis.kakao_base_url),
            ("apis.naver_base_url", &self.apis.naver_base_url),
            ("llm.base_url", &self.llm.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(InboundAiError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.forecast.outlier_country.trim().is_empty() {
            return Err(InboundAiError::config("Outlier country cannot be empty").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = InboundAiConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.forecast.outlier_country, "중국");
        assert_eq!(config.forecast.cap_ratio, 1.1);
        assert_eq!(config.forecast.floor_factor, 1.5);
        assert_eq!(config.forecast.excluded_years, vec![2020, 2021, 2022]);
        assert_eq!(config.llm.model, "google/gemma-2-9b-it");
        assert_eq!(config.planner.visitor_threshold, 30_000);
        assert!(config.llm.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_forecast_window() {
        let config = InboundAiConfig::default();
        assert_eq!(config.forecast.start(), YearMonth::new(2025, 1));
        assert_eq!(config.forecast.end(), YearMonth::new(2026, 12));
    }

    #[test]
    fn test_config_validation_blank_key() {
        let mut config = InboundAiConfig::default();
        config.llm.api_key = Some("   ".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("llm.api_key"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = InboundAiConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = InboundAiConfig::default();
        config.planner.spot_display = 20;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Spot display"));
    }

    #[test]
    fn test_config_validation_session_idle() {
        let mut config = InboundAiConfig::default();
        assert_eq!(config.server.session_idle_minutes, 60);
        config.server.session_idle_minutes = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Session idle timeout"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[forecast]
outlier_country = "일본"
horizon_months = 12
"#
        )
        .unwrap();

        let config = InboundAiConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.forecast.outlier_country, "일본");
        assert_eq!(config.forecast.horizon_months, 12);
        // untouched sections keep their defaults
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = InboundAiConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("inboundai"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
