use crate::domain::TradeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub pnl_mode: PnlMode,
    /// Trade ids confirmed as broker data corruption; never matched.
    pub excluded_trade_ids: BTreeSet<TradeId>,
    pub max_body_bytes: usize,
}

/// Whether P&L figures include fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PnlMode {
    #[default]
    Gross,
    Net,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            pnl_mode: PnlMode::Gross,
            excluded_trade_ids: BTreeSet::new(),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match env_map.get("PORT") {
            Some(s) => s.parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?,
            None => defaults.port,
        };

        let bind_addr = match env_map.get("BIND_ADDR") {
            Some(s) => s.parse::<IpAddr>().map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?,
            None => defaults.bind_addr,
        };

        let pnl_mode = match env_map
            .get("PNL_MODE")
            .map(|s| s.as_str())
            .unwrap_or("gross")
        {
            "gross" => PnlMode::Gross,
            "net" => PnlMode::Net,
            other => {
                return Err(ConfigError::InvalidValue(
                    "PNL_MODE".to_string(),
                    format!("must be gross or net, got {}", other),
                ))
            }
        };

        let max_body_bytes = match env_map.get("MAX_BODY_BYTES") {
            Some(s) => s.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(
                    "MAX_BODY_BYTES".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?,
            None => defaults.max_body_bytes,
        };

        let excluded_trade_ids = parse_excluded_trade_ids_from_map(&env_map)?;

        Ok(Config {
            port,
            bind_addr,
            pnl_mode,
            excluded_trade_ids,
            max_body_bytes,
        })
    }
}

fn parse_excluded_trade_ids_from_map(
    env_map: &HashMap<String, String>,
) -> Result<BTreeSet<TradeId>, ConfigError> {
    let raw: Vec<String> = if let Some(ids) = env_map.get("EXCLUDED_TRADE_IDS") {
        ids.split(',').map(|s| s.trim().to_string()).collect()
    } else if let Some(file_path) = env_map.get("EXCLUDED_TRADE_IDS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "EXCLUDED_TRADE_IDS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        content.lines().map(|line| line.trim().to_string()).collect()
    } else {
        Vec::new()
    };

    Ok(raw
        .into_iter()
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .map(TradeId::new)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1");
        assert_eq!(config.pnl_mode, PnlMode::Gross);
        assert!(config.excluded_trade_ids.is_empty());
    }

    #[test]
    fn test_invalid_port() {
        let env_map = HashMap::from([("PORT".to_string(), "not_a_number".to_string())]);
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_pnl_mode() {
        let env_map = HashMap::from([("PNL_MODE".to_string(), "invalid".to_string())]);
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PNL_MODE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_net_pnl_mode() {
        let env_map = HashMap::from([("PNL_MODE".to_string(), "net".to_string())]);
        assert_eq!(Config::from_env_map(env_map).unwrap().pnl_mode, PnlMode::Net);
    }

    #[test]
    fn test_excluded_trade_ids_from_list() {
        let env_map = HashMap::from([(
            "EXCLUDED_TRADE_IDS".to_string(),
            " T-9, ,T-10 ".to_string(),
        )]);
        let config = Config::from_env_map(env_map).unwrap();
        let ids: Vec<_> = config.excluded_trade_ids.iter().map(|t| t.as_str()).collect();
        assert_eq!(ids, vec!["T-10", "T-9"]);
    }

    #[test]
    fn test_excluded_trade_ids_file_missing() {
        let env_map = HashMap::from([(
            "EXCLUDED_TRADE_IDS_FILE".to_string(),
            "/nonexistent/excluded.txt".to_string(),
        )]);
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "EXCLUDED_TRADE_IDS_FILE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_excluded_trade_ids_file_skips_comments() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("excluded.txt");
        std::fs::write(&path, "# corrupted fills\nT-1\n\nT-2\n").unwrap();
        let env_map = HashMap::from([(
            "EXCLUDED_TRADE_IDS_FILE".to_string(),
            path.to_string_lossy().to_string(),
        )]);
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.excluded_trade_ids.len(), 2);
        assert!(config.excluded_trade_ids.contains(&TradeId::new("T-1")));
    }

    #[test]
    fn test_invalid_bind_addr() {
        let env_map = HashMap::from([("BIND_ADDR".to_string(), "localhost:80".to_string())]);
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "BIND_ADDR"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
