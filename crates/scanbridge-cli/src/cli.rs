//! Command line definition.

use crate::logging::LogFormat;
use clap::{ArgAction, Args, Parser, Subcommand};
use scanbridge_core::{BridgeConfig, ConfigOverrides, ReconnectOverrides, Result};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scanbridge",
    version,
    about = "Forward fingerprint scanner readings from a serial port to an HTTP backend"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Compact,
        env = "SCANBRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the scanner and forward every reading until interrupted
    Run(RunArgs),
    /// Classify lines offline and print the requests they would produce
    Classify(ClassifyArgs),
    /// Print the effective configuration as TOML
    Config(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Replay a capture file instead of opening the serial port
    #[arg(long, value_name = "FILE", env = "SCANBRIDGE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Pause between replayed lines
    #[arg(long, value_name = "MS", default_value_t = 0, env = "SCANBRIDGE_REPLAY_DELAY_MS")]
    pub replay_delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Scanner lines to classify
    #[arg(required = true, value_name = "LINE")]
    pub lines: Vec<String>,
}

/// Flags layered over the defaults and the optional config file.
#[derive(Debug, Default, Args)]
pub struct SettingsArgs {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "SCANBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serial device (e.g. /dev/ttyACM0 or COM3)
    #[arg(short, long, value_name = "ID", env = "SCANBRIDGE_PORT")]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(short, long, value_name = "N", env = "SCANBRIDGE_BAUD")]
    pub baud: Option<u32>,

    /// Backend base URL; both endpoints are derived from it
    #[arg(long, value_name = "URL", env = "SCANBRIDGE_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Full URL for numeric readings
    #[arg(long, value_name = "URL", env = "SCANBRIDGE_NUMERIC_ENDPOINT")]
    pub numeric_endpoint: Option<String>,

    /// Full URL for no-match diagnostics
    #[arg(long, value_name = "URL", env = "SCANBRIDGE_DIAGNOSTICS_ENDPOINT")]
    pub diagnostics_endpoint: Option<String>,

    /// Overall timeout of one backend request
    #[arg(long, value_name = "MS", env = "SCANBRIDGE_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Timeout for establishing a backend connection
    #[arg(long, value_name = "MS", env = "SCANBRIDGE_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: Option<u64>,

    /// Longest wait for one line before checking for shutdown
    #[arg(long, value_name = "MS", env = "SCANBRIDGE_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Reopen attempts after the device is lost or fails to open
    #[arg(long, value_name = "N", env = "SCANBRIDGE_RECONNECT_ATTEMPTS")]
    pub reconnect_attempts: Option<u32>,

    /// Pause between reopen attempts
    #[arg(long, value_name = "MS", env = "SCANBRIDGE_RECONNECT_DELAY_MS")]
    pub reconnect_delay_ms: Option<u64>,
}

impl SettingsArgs {
    /// Flags as a partial configuration.
    pub fn overrides(&self) -> ConfigOverrides {
        let reconnect = (self.reconnect_attempts.is_some() || self.reconnect_delay_ms.is_some())
            .then(|| ReconnectOverrides {
                max_attempts: self.reconnect_attempts,
                delay_ms: self.reconnect_delay_ms,
            });

        ConfigOverrides {
            device_id: self.port.clone(),
            baud_rate: self.baud,
            backend_url: self.backend_url.clone(),
            numeric_endpoint: self.numeric_endpoint.clone(),
            diagnostics_endpoint: self.diagnostics_endpoint.clone(),
            request_timeout_ms: self.request_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            reconnect,
        }
    }

    /// Resolve defaults, then the config file, then flags, and validate.
    ///
    /// # Errors
    /// Returns the core configuration error if the file cannot be read or
    /// parsed, or if the merged result is invalid.
    pub fn load(&self) -> Result<BridgeConfig> {
        let mut config = BridgeConfig::default();
        if let Some(path) = &self.config {
            config = config.apply(ConfigOverrides::from_file(path)?);
        }
        let config = config.apply(self.overrides());
        config.validate()?;
        Ok(config)
    }
}
