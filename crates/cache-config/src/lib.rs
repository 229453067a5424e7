//! TOML-backed configuration, following the `#[serde(default = "fn")]`
//! convention used throughout the teacher's `config` crate
//! (`src/config/src/proxy.rs`) and the top-level `Config` struct shape of
//! `server/segcache/src/config.rs`.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::net::{AddrParseError, SocketAddr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid listen address: {0}")]
    Address(#[from] AddrParseError),
}

const LISTEN_ADDRESS: &str = "0.0.0.0:8080";
const MAX_KEY_SIZE: usize = 256;
const MAX_VALUE_SIZE: usize = 1024 * 1024;
const MAX_ITEM_TTL: i64 = 60 * 60 * 24 * 30;
const MAX_MEM: usize = 256 * 1024 * 1024;
const COMPRESSION_THRESHOLD: usize = 16 * 1024;

fn listen_address() -> String {
    LISTEN_ADDRESS.to_string()
}

fn max_key_size() -> usize {
    MAX_KEY_SIZE
}

fn max_value_size() -> usize {
    MAX_VALUE_SIZE
}

fn max_item_ttl() -> i64 {
    MAX_ITEM_TTL
}

fn max_mem() -> usize {
    MAX_MEM
}

fn compression_threshold() -> usize {
    COMPRESSION_THRESHOLD
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Server {
    #[serde(default = "listen_address")]
    address: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            address: listen_address(),
        }
    }
}

impl Server {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address.parse()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Limits {
    #[serde(default = "max_key_size")]
    pub max_key_size: usize,
    #[serde(default = "max_value_size")]
    pub max_value_size: usize,
    #[serde(default = "max_item_ttl")]
    pub max_item_ttl: i64,
    #[serde(default = "max_mem")]
    pub max_mem: usize,
    #[serde(default = "compression_threshold")]
    pub compression_threshold: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_key_size: max_key_size(),
            max_value_size: max_value_size(),
            max_item_ttl: max_item_ttl(),
            max_mem: max_mem(),
            compression_threshold: compression_threshold(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub limits: Limits,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let config: Config = toml::from_str(&content)?;

        // validate eagerly, the way `server/segcache/src/config.rs` checks
        // the metrics interval at load time rather than at first use.
        config.server.socket_addr()?;

        Ok(config)
    }

    pub fn listen(&self) -> SocketAddr {
        self.server
            .socket_addr()
            .expect("address validated at load time")
    }

    pub fn print(&self) {
        match toml::to_string_pretty(self) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("failed to print config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let config = Config::default();
        assert!(config.listen().port() > 0);
        assert!(config.limits.max_key_size > 0);
        assert!(config.limits.max_value_size > 0);
    }
}
