use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::SocketAddr;

/// Listener settings shared by every service.
///
/// Read from an optional `configuration` file, then `APP__*` environment
/// variables (`APP__PORT=9000`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("invalid bind address: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg: Config = Cfg::builder()
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("empty source should deserialize with defaults");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(
            cfg.bind_addr().expect("default address parses").port(),
            8080
        );
    }

    #[test]
    fn bad_host_is_a_config_error() {
        let cfg = Config {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(matches!(cfg.bind_addr(), Err(AppError::ConfigError(_))));
    }
}
