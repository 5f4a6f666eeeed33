//! Configuration file for foci-animate.
//!
//! The file is optional. It is looked up in this order:
//! 1. `--config <path>`
//! 2. `FOCI_CONFIG`
//! 3. `./foci-animate.yaml`
//!
//! Supports environment variable substitution using `${VAR}` and
//! `${VAR:-default}` syntax. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use animation::{AnimationSettings, SaveOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "foci-animate.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Style and animation defaults, overridden by flags
    pub defaults: AnimationSettings,
    pub save: SaveOptions,
    pub logging: LoggingConfig,
    /// TrueType font for titles and labels
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// The config file to read: the explicit path, or the default file if present.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Load the config, or defaults when there is no file.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    let Some(path) = config_path(explicit) else {
        return Ok((AppConfig::default(), None));
    };
    let config = load_config_file(&path)?;
    Ok((config, Some(path)))
}

pub fn load_config_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    parse_config(&content).with_context(|| format!("Failed to parse config from {:?}", path))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    let expanded = expand_env_vars(content)?;
    let mut config: AppConfig = serde_yaml::from_str(&expanded)?;
    validate_config(&config)?;
    if config.defaults.font_path.is_none() {
        config.defaults.font_path = config.font_path.clone();
    }
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    anyhow::ensure!(
        valid_levels.contains(&config.logging.level.to_ascii_lowercase().as_str()),
        "Invalid log level: {}. Must be one of: {:?}",
        config.logging.level,
        valid_levels
    );
    anyhow::ensure!(
        config.defaults.interval_ms > 0,
        "defaults.interval_ms must be greater than 0"
    );
    config.defaults.plot_style().resolve()?;
    Ok(())
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::LevelSpec;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("FOCI_TEST_CMAP", "viridis");
        let result = expand_env_vars("colormap: ${FOCI_TEST_CMAP}").unwrap();
        assert_eq!(result, "colormap: viridis");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("FOCI_TEST_UNSET");
        let result = expand_env_vars("level: ${FOCI_TEST_UNSET:-debug}").unwrap();
        assert_eq!(result, "level: debug");
    }

    #[test]
    fn test_expand_env_vars_errors() {
        std::env::remove_var("FOCI_TEST_REQUIRED");
        assert!(expand_env_vars("${FOCI_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaults.levels, LevelSpec::Count(20));
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r##"
font_path: /usr/share/fonts/truetype/dejavu/DejaVuSans.ttf
defaults:
  levels: 15
  colormap: RdBu_r
  interval_ms: 100
  style:
    land_color: "#C0C0C0"
    coastline_width: 1.2
save:
  bitrate: 1800
logging:
  level: debug
  format: json
"##;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.defaults.levels, LevelSpec::Count(15));
        assert_eq!(config.defaults.colormap, "RdBu_r");
        assert_eq!(config.defaults.style.coastline_width, 1.2);
        assert_eq!(config.save.bitrate, Some(1800));
        assert!(config.logging.is_json());
        assert_eq!(
            config.defaults.font_path.as_deref(),
            Some(Path::new("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"))
        );
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(include_str!("../foci-animate.example.yaml")).unwrap();
        assert_eq!(config.defaults, {
            let mut expected = AnimationSettings::default();
            expected.font_path = config.font_path.clone();
            expected
        });
        assert_eq!(config.save, SaveOptions::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("logging:\n  level: loud\n").is_err());
        assert!(parse_config("defaults:\n  colormap: nope\n").is_err());
        assert!(parse_config("defaults:\n  interval_ms: 0\n").is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "defaults:\n  show_timestep: false\n").unwrap();

        let (config, used) = load_config(Some(&path)).unwrap();
        assert!(!config.defaults.show_timestep);
        assert_eq!(used, Some(path));

        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());
    }
}
