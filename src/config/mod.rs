mod file_config;

pub use file_config::FileConfig;

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub tools_file: PathBuf,
    pub downstream_url: String,
    pub downstream_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub tools_file: PathBuf,
    pub downstream_url: String,
    pub downstream_timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let host = file.host.unwrap_or_else(|| cli.host.clone());
        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let tools_file = file
            .tools_file
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.tools_file.clone());
        if !tools_file.exists() {
            bail!("Tool definitions file does not exist: {:?}", tools_file);
        }
        if !tools_file.is_file() {
            bail!("Tool definitions path is not a file: {:?}", tools_file);
        }

        let downstream_url = file
            .downstream_url
            .unwrap_or_else(|| cli.downstream_url.clone());
        if !downstream_url.starts_with("http://") && !downstream_url.starts_with("https://") {
            bail!(
                "downstream_url must be an http:// or https:// URL, got {:?}",
                downstream_url
            );
        }

        let downstream_timeout_sec = file
            .downstream_timeout_sec
            .unwrap_or(cli.downstream_timeout_sec);
        if downstream_timeout_sec == 0 {
            bail!("downstream_timeout_sec must be greater than 0");
        }

        Ok(Self {
            host,
            port,
            logging_level,
            tools_file,
            downstream_url,
            downstream_timeout_sec,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
