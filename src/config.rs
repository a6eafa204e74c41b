use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

const DEFAULT_TTL_HOURS: i64 = 24;

/// Optional TOML file layer. Every key can also come from the environment.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    bot_token: Option<String>,
    #[serde(default)]
    operator_id: Option<u64>,
    #[serde(default)]
    ttl_hours: Option<i64>,
    #[serde(default)]
    sweep_cron: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Telegram user id that receives notifications and may run commands
    pub operator_id: u64,
    pub ttl: Duration,
    pub sweep_cron: String,
}

fn default_sweep_cron() -> String {
    // Top of every hour
    "0 0 * * * *".to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn positive_hours(hours: i64) -> Option<Duration> {
    Duration::try_hours(hours).filter(|_| hours > 0)
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file: FileConfig = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = non_blank(env("BOT_TOKEN"))
            .or_else(|| non_blank(file.bot_token))
            .context("BOT_TOKEN is not set")?;

        let operator_id = match env("YOUR_USER_ID") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid YOUR_USER_ID: {:?}", raw))?,
            None => match file.operator_id {
                Some(id) => id,
                None => bail!("YOUR_USER_ID is not set"),
            },
        };

        let ttl = match env("MESSAGE_TTL_HOURS") {
            Some(raw) => {
                let ttl = raw.trim().parse::<i64>().ok().and_then(positive_hours);
                if ttl.is_none() {
                    warn!(
                        "Ignoring invalid MESSAGE_TTL_HOURS {:?}, using {}h",
                        raw, DEFAULT_TTL_HOURS
                    );
                }
                ttl
            }
            None => file.ttl_hours.and_then(|hours| {
                let ttl = positive_hours(hours);
                if ttl.is_none() {
                    warn!(
                        "Ignoring invalid ttl_hours {}, using {}h",
                        hours, DEFAULT_TTL_HOURS
                    );
                }
                ttl
            }),
        }
        .unwrap_or_else(|| Duration::hours(DEFAULT_TTL_HOURS));

        let sweep_cron = non_blank(env("SWEEP_CRON"))
            .or_else(|| non_blank(file.sweep_cron))
            .unwrap_or_else(default_sweep_cron);

        Ok(Config {
            bot_token,
            operator_id,
            ttl,
            sweep_cron,
        })
    }
}
