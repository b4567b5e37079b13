use crate::error::ConfigError;
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

pub const TABLE_VAR: &str = "PROFIT_TABLE";
pub const ARTIFACTS_VAR: &str = "PROFIT_ARTIFACTS";
pub const DELIMITER_VAR: &str = "PROFIT_DELIMITER";
pub const LOG_VAR: &str = "PROFIT_LOG";

/// Where the startup inputs live.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_path: PathBuf,
    pub artifacts_path: PathBuf,
    pub delimiter: u8,
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("data/restaurant_profitability.csv"),
            artifacts_path: PathBuf::from("model/artifacts.json"),
            delimiter: b';',
            log_path: PathBuf::from("target/menu_profit.log"),
        }
    }
}

impl Config {
    /// Reads the environment, falling back to the defaults for anything
    /// unset.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            table_path: try_load(TABLE_VAR, defaults.table_path)?,
            artifacts_path: try_load(ARTIFACTS_VAR, defaults.artifacts_path)?,
            delimiter: parse_delimiter(&try_load(DELIMITER_VAR, ";".to_string())?)?,
            log_path: try_load(LOG_VAR, defaults.log_path)?,
        })
    }
}

fn try_load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            }
        }),
        Err(_) => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}

/// The table delimiter must be a single byte, e.g. `;` or `,`.
pub fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(ConfigError::Invalid {
            key: DELIMITER_VAR,
            value: value.to_string(),
            reason: "expected a single-byte delimiter".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_must_be_one_byte() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_defaults_point_at_bundled_data() {
        let config = Config::default();
        assert_eq!(config.delimiter, b';');
        assert!(config.table_path.ends_with("restaurant_profitability.csv"));
        assert_eq!(config.artifacts_path, PathBuf::from("model/artifacts.json"));
    }
}
