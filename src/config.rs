use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormConfig {
    /// Birth date the form resets to when cleared
    #[serde(default = "default_birth_date")]
    pub default_birth_date: NaiveDate,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_birth_date: default_birth_date(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

pub fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(path, &content)
    }

    /// Load `path` if it exists, fall back to defaults otherwise
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_yaml(path: &str, content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(path.to_string(), e))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen.address, self.listen.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(
            config.form.default_birth_date,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "listen:\n  port: 8080\n";
        let config = Config::from_yaml("inline.yaml", yaml).unwrap();

        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.form.default_birth_date, default_birth_date());
    }

    #[test]
    fn test_form_birth_date_from_yaml() {
        let yaml = "form:\n  default_birth_date: 2005-09-01\n";
        let config = Config::from_yaml("inline.yaml", yaml).unwrap();

        assert_eq!(
            config.form.default_birth_date,
            NaiveDate::from_ymd_opt(2005, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        let result = Config::from_yaml("broken.yaml", "listen: [1, 2");
        assert!(matches!(result, Err(ConfigError::ParseError(path, _)) if path == "broken.yaml"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default("/nonexistent/registry-code.yaml").unwrap();
        assert_eq!(config.listen.port, 3000);
    }
}
