use crate::error::{GeosightError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_WMS_BASE_URL: &str =
    "https://sh.dataspace.copernicus.eu/ogc/wms/2e44e6fc-1f1c-4258-bd09-8a15c317f604";
pub const DEFAULT_ANALYSIS_API_URL: &str = "http://chat.misbar.africa";
pub const DEFAULT_PERSISTENCE_API_URL: &str = "http://api.misbar.africa";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str =
    concat!("geosight/", env!("CARGO_PKG_VERSION"), " (environmental-analysis client)");

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the current precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoSight endpoints and request defaults
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub wms_base_url: ConfigValue<String>,
    pub analysis_api_url: ConfigValue<String>,
    pub persistence_api_url: ConfigValue<String>,
    pub geocoder_url: ConfigValue<String>,
    pub user_agent: ConfigValue<String>,
    pub default_cloud_ceiling: ConfigValue<u8>,
    pub request_timeout_secs: ConfigValue<u64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            wms_base_url: ConfigValue::new(DEFAULT_WMS_BASE_URL.to_string(), ConfigSource::Default),
            analysis_api_url: ConfigValue::new(
                DEFAULT_ANALYSIS_API_URL.to_string(),
                ConfigSource::Default,
            ),
            persistence_api_url: ConfigValue::new(
                DEFAULT_PERSISTENCE_API_URL.to_string(),
                ConfigSource::Default,
            ),
            geocoder_url: ConfigValue::new(DEFAULT_GEOCODER_URL.to_string(), ConfigSource::Default),
            user_agent: ConfigValue::new(DEFAULT_USER_AGENT.to_string(), ConfigSource::Default),
            default_cloud_ceiling: ConfigValue::new(20, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(300, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeosightError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeosightError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.wms_base_url {
            self.wms_base_url.update(parse_url("wms_base_url", &url)?, ConfigSource::File);
        }

        if let Some(url) = file_config.analysis_api_url {
            self.analysis_api_url.update(parse_url("analysis_api_url", &url)?, ConfigSource::File);
        }

        if let Some(url) = file_config.persistence_api_url {
            self.persistence_api_url
                .update(parse_url("persistence_api_url", &url)?, ConfigSource::File);
        }

        if let Some(url) = file_config.geocoder_url {
            self.geocoder_url.update(parse_url("geocoder_url", &url)?, ConfigSource::File);
        }

        if let Some(user_agent) = file_config.user_agent {
            self.user_agent.update(user_agent, ConfigSource::File);
        }

        if let Some(ceiling) = file_config.default_cloud_ceiling {
            self.default_cloud_ceiling
                .update(parse_cloud_ceiling(&ceiling.to_string())?, ConfigSource::File);
        }

        if let Some(timeout) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(timeout, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let urls = [
            ("GEOSIGHT_WMS_BASE_URL", "wms_base_url"),
            ("GEOSIGHT_ANALYSIS_API_URL", "analysis_api_url"),
            ("GEOSIGHT_PERSISTENCE_API_URL", "persistence_api_url"),
            ("GEOSIGHT_GEOCODER_URL", "geocoder_url"),
        ];

        for (var, key) in urls {
            if let Ok(raw) = env::var(var) {
                match parse_url(key, &raw) {
                    Ok(url) => self.url_field(key).update(url, ConfigSource::Environment),
                    Err(_) => tracing::warn!(
                        "Invalid {} value '{}': expected an http:// or https:// URL",
                        var,
                        raw
                    ),
                }
            }
        }

        // GEOSIGHT_USER_AGENT
        if let Ok(user_agent) = env::var("GEOSIGHT_USER_AGENT") {
            self.user_agent.update(user_agent, ConfigSource::Environment);
        }

        // GEOSIGHT_DEFAULT_CLOUD_CEILING
        if let Ok(raw) = env::var("GEOSIGHT_DEFAULT_CLOUD_CEILING") {
            match parse_cloud_ceiling(&raw) {
                Ok(ceiling) => {
                    self.default_cloud_ceiling.update(ceiling, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid GEOSIGHT_DEFAULT_CLOUD_CEILING value '{}': expected 0-100",
                    raw
                ),
            }
        }

        // GEOSIGHT_REQUEST_TIMEOUT_SECS
        if let Ok(raw) = env::var("GEOSIGHT_REQUEST_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(timeout) => self.request_timeout_secs.update(timeout, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOSIGHT_REQUEST_TIMEOUT_SECS value '{}': expected seconds",
                    raw
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(url) = overrides.wms_base_url {
            self.wms_base_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.analysis_api_url {
            self.analysis_api_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.persistence_api_url {
            self.persistence_api_url.update(url, ConfigSource::Cli);
        }

        if let Some(url) = overrides.geocoder_url {
            self.geocoder_url.update(url, ConfigSource::Cli);
        }

        if let Some(ceiling) = overrides.default_cloud_ceiling {
            self.default_cloud_ceiling.update(ceiling, ConfigSource::Cli);
        }
    }

    fn url_field(&mut self, key: &str) -> &mut ConfigValue<String> {
        match key {
            "wms_base_url" => &mut self.wms_base_url,
            "analysis_api_url" => &mut self.analysis_api_url,
            "persistence_api_url" => &mut self.persistence_api_url,
            _ => &mut self.geocoder_url,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "wms_base_url".to_string(),
            (self.wms_base_url.value.clone(), self.wms_base_url.source),
        );
        map.insert(
            "analysis_api_url".to_string(),
            (self.analysis_api_url.value.clone(), self.analysis_api_url.source),
        );
        map.insert(
            "persistence_api_url".to_string(),
            (self.persistence_api_url.value.clone(), self.persistence_api_url.source),
        );
        map.insert(
            "geocoder_url".to_string(),
            (self.geocoder_url.value.clone(), self.geocoder_url.source),
        );
        map.insert(
            "user_agent".to_string(),
            (self.user_agent.value.clone(), self.user_agent.source),
        );
        map.insert(
            "default_cloud_ceiling".to_string(),
            (format!("{}%", self.default_cloud_ceiling.value), self.default_cloud_ceiling.source),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            (format!("{}s", self.request_timeout_secs.value), self.request_timeout_secs.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    wms_base_url: Option<String>,
    analysis_api_url: Option<String>,
    persistence_api_url: Option<String>,
    geocoder_url: Option<String>,
    user_agent: Option<String>,
    default_cloud_ceiling: Option<i64>,
    request_timeout_secs: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub wms_base_url: Option<String>,
    pub analysis_api_url: Option<String>,
    pub persistence_api_url: Option<String>,
    pub geocoder_url: Option<String>,
    pub default_cloud_ceiling: Option<u8>,
}

/// Accept an absolute http(s) URL, dropping any trailing slash
pub fn parse_url(key: &str, s: &str) -> Result<String> {
    let trimmed = s.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(GeosightError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Invalid URL: {}. Use an http:// or https:// URL", s),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Parse a cloud ceiling percentage
pub fn parse_cloud_ceiling(s: &str) -> Result<u8> {
    match s.trim().parse::<u8>() {
        Ok(value) if value <= 100 => Ok(value),
        _ => Err(GeosightError::ConfigInvalid {
            key: "default_cloud_ceiling".to_string(),
            reason: format!("Invalid cloud ceiling: {}. Use a percentage from 0 to 100", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.wms_base_url.value, DEFAULT_WMS_BASE_URL);
        assert_eq!(config.wms_base_url.source, ConfigSource::Default);
        assert_eq!(config.default_cloud_ceiling.value, 20);
        assert!(config.user_agent.value.starts_with("geosight/"));
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
analysis_api_url = "https://analysis.example/"
geocoder_url = "http://localhost:8080"
default_cloud_ceiling = 35
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.analysis_api_url.value, "https://analysis.example");
        assert_eq!(config.analysis_api_url.source, ConfigSource::File);
        assert_eq!(config.geocoder_url.value, "http://localhost:8080");
        assert_eq!(config.default_cloud_ceiling.value, 35);
        assert_eq!(config.wms_base_url.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "default_cloud_ceiling = 140").unwrap();
        assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"geocoder_url = "nominatim.local""#).unwrap();
        assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            analysis_api_url: Some("http://localhost:5000".to_string()),
            default_cloud_ceiling: Some(50),
            ..Default::default()
        });

        assert_eq!(config.analysis_api_url.value, "http://localhost:5000");
        assert_eq!(config.analysis_api_url.source, ConfigSource::Cli);
        assert_eq!(config.default_cloud_ceiling.value, 50);
        // These should still be defaults
        assert_eq!(config.geocoder_url.source, ConfigSource::Default);
        assert_eq!(config.user_agent.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_url("k", " https://x.example/ ").unwrap(), "https://x.example");
        assert!(parse_url("k", "ftp://x.example").is_err());
        assert_eq!(parse_cloud_ceiling("0").unwrap(), 0);
        assert_eq!(parse_cloud_ceiling("100").unwrap(), 100);
        assert!(parse_cloud_ceiling("-5").is_err());
        assert!(parse_cloud_ceiling("101").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert_eq!(map.len(), 7);
        let (ceiling, source) = &map["default_cloud_ceiling"];
        assert_eq!(ceiling, "20%");
        assert_eq!(*source, ConfigSource::Default);
    }
}
