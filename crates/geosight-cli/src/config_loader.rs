//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geosight_core::config::{parse_url, CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// File picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "geosight.toml";

/// Defaults, then the config file, then `GEOSIGHT_*` variables.
///
/// An explicit `--config` path must exist; the implicit `geosight.toml` is
/// optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match explicit {
        Some(path) => {
            config = config
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None => {
            let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                config = config
                    .load_from_file(&implicit)
                    .context("Failed to load configuration file")?;
            }
        }
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with the global CLI overrides applied last
pub fn load_config_with_overrides(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.update_from_cli(overrides_from(cli)?);
    Ok(config)
}

fn overrides_from(cli: &Cli) -> Result<CliConfigOverrides> {
    let url = |key: &str, value: &Option<String>| -> Result<Option<String>> {
        Ok(value.as_deref().map(|raw| parse_url(key, raw)).transpose()?)
    };

    Ok(CliConfigOverrides {
        wms_base_url: url("wms_base_url", &cli.wms_url)?,
        analysis_api_url: url("analysis_api_url", &cli.analysis_url)?,
        persistence_api_url: url("persistence_api_url", &cli.persistence_url)?,
        geocoder_url: url("geocoder_url", &cli.geocoder_url)?,
        default_cloud_ceiling: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use geosight_core::config::ConfigSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_and_cli_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "analysis_api_url = \"http://file.example\"\ngeocoder_url = \"http://geo.example\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "geosight",
            "--config",
            path.to_str().unwrap(),
            "--analysis-url",
            "http://cli.example/",
            "config",
        ])
        .unwrap();
        let config = load_config_with_overrides(&cli).unwrap();

        assert_eq!(config.analysis_api_url.value, "http://cli.example");
        assert_eq!(config.analysis_api_url.source, ConfigSource::Cli);
        assert_eq!(config.geocoder_url.source, ConfigSource::File);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/geosight.toml"))).is_err());
    }

    #[test]
    fn test_invalid_override_url_is_rejected() {
        let cli = Cli::try_parse_from(["geosight", "--wms-url", "ftp://nope", "config"]).unwrap();
        assert!(load_config_with_overrides(&cli).is_err());
    }
}
