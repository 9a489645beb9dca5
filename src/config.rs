// Process configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use ed25519_dalek::VerifyingKey;

use crate::discord::http::DEFAULT_API_BASE;
use crate::discord::interaction::parse_public_key;
use crate::discord::Snowflake;

pub const DEFAULT_HIGHLIGHT: &str = "[DR] Dragons Breath";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token used for REST calls.
    pub token: String,
    /// Application id the slash commands are registered under.
    pub application_id: Snowflake,
    /// Key that signs inbound interaction requests.
    pub public_key: VerifyingKey,
    pub api_base_url: String,
    /// Score ledger file.
    pub data_file: PathBuf,
    /// Per-guild settings file.
    pub config_file: PathBuf,
    pub port: u16,
    /// Group surfaced in the standings even when it is outside the top.
    pub highlight_gang: String,
    /// Zone the reminder slots are evaluated in.
    pub utc_offset: FixedOffset,
    /// How often the rainbow role changes color; zero disables it.
    pub color_cycle_interval: Duration,
    /// Whether to overwrite the registered slash commands at startup.
    pub sync_commands: bool,
}

impl Config {
    /// Load configuration from the process environment and arguments.
    ///
    /// Environment variables:
    /// - `TOKEN` - bot token (required)
    /// - `DISCORD_APPLICATION_ID` - application id (required)
    /// - `DISCORD_PUBLIC_KEY` - hex interaction verification key (required)
    /// - `DISCORD_API_URL` - REST base (default: `https://discord.com/api/v10`)
    /// - `DATA_FILE` - score ledger path (default: `data.json`)
    /// - `CONFIG_FILE` - guild settings path (default: `config.json`)
    /// - `PORT` - HTTP port for the interactions endpoint (default: 3000)
    /// - `HIGHLIGHT_GANG` - highlighted group (default: `[DR] Dragons Breath`)
    /// - `UTC_OFFSET_HOURS` - reminder zone offset (default: 7, Asia/Ho_Chi_Minh)
    /// - `COLOR_CYCLE_SECS` - rainbow role period (default: 300, 0 disables)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - override the port
    /// - `--skip-sync` - do not re-register slash commands
    pub fn load() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from explicit arguments and an environment lookup.
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let token = required("TOKEN")?;

        let application_id = required("DISCORD_APPLICATION_ID")?
            .trim()
            .parse::<Snowflake>()
            .map_err(|e| ConfigError::Invalid {
                name: "DISCORD_APPLICATION_ID",
                reason: e.to_string(),
            })?;

        let public_key =
            parse_public_key(&required("DISCORD_PUBLIC_KEY")?).map_err(|e| ConfigError::Invalid {
                name: "DISCORD_PUBLIC_KEY",
                reason: e.to_string(),
            })?;

        let api_base_url = env("DISCORD_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let data_file = env("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data.json"));
        let config_file = env("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.json"));

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = match Self::parse_cli_value(args, "--port").or_else(|| env("PORT")) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("`{raw}` is not a port number"),
            })?,
            None => 3000,
        };

        let highlight_gang = env("HIGHLIGHT_GANG").unwrap_or_else(|| DEFAULT_HIGHLIGHT.to_string());

        let offset_hours = match env("UTC_OFFSET_HOURS") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|e| ConfigError::Invalid {
                name: "UTC_OFFSET_HOURS",
                reason: e.to_string(),
            })?,
            None => 7,
        };
        let utc_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                name: "UTC_OFFSET_HOURS",
                reason: format!("{offset_hours} is outside -23..=23"),
            })?;

        let color_cycle_secs = match env("COLOR_CYCLE_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "COLOR_CYCLE_SECS",
                reason: e.to_string(),
            })?,
            None => 300,
        };

        let sync_commands = !args.iter().any(|a| a == "--skip-sync");

        Ok(Config {
            token,
            application_id,
            public_key,
            api_base_url,
            data_file,
            config_file,
            port,
            highlight_gang,
            utc_offset,
            color_cycle_interval: Duration::from_secs(color_cycle_secs),
            sync_commands,
        })
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
