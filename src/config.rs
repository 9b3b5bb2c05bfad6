//! Configuration types, read from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::warn;

use crate::error::ConfigError;
use crate::records::{ServiceAccountKey, SheetsConfig};
use crate::router::FlowConfig;
use crate::session::Profile;

const DEFAULT_DB_PATH: &str = "./data/intake.db";
const DEFAULT_SHEET_RANGE: &str = "Sheet1";

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// `None` when no bot token is set.
    pub telegram: Option<TelegramConfig>,
    /// Local stdin/stdout channel.
    pub cli_enabled: bool,
    pub records: RecordStoreConfig,
    pub flow: FlowConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    /// Usernames or numeric ids; `*` allows everyone.
    pub allowed_users: Vec<String>,
}

/// Where completed questionnaires go.
#[derive(Debug, Clone)]
pub enum RecordStoreConfig {
    Sheets(SheetsConfig),
    LibSql { path: PathBuf },
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let telegram = var("BOT_TOKEN").map(|token| TelegramConfig {
            bot_token: SecretString::from(token),
            allowed_users: split_list(&var("TELEGRAM_ALLOWED_USERS").unwrap_or_else(|| "*".into())),
        });

        let cli_enabled = match var("INTAKE_CLI") {
            Some(v) => parse_bool("INTAKE_CLI", &v)?,
            None => telegram.is_none(),
        };
        if telegram.is_none() && !cli_enabled {
            return Err(ConfigError::MissingEnvVar(
                "BOT_TOKEN (or set INTAKE_CLI=true)".into(),
            ));
        }

        let records = match (var("GOOGLE_CREDENTIALS"), var("GOOGLE_SPREADSHEET_ID")) {
            (Some(credentials), Some(spreadsheet_id)) => {
                let key = ServiceAccountKey::from_json(&load_credentials(&credentials)?)?;
                let range = var("GOOGLE_SHEET_RANGE").unwrap_or_else(|| DEFAULT_SHEET_RANGE.into());
                RecordStoreConfig::Sheets(SheetsConfig::new(key, spreadsheet_id).with_range(range))
            }
            (credentials, spreadsheet_id) => {
                if credentials.is_some() || spreadsheet_id.is_some() {
                    warn!(
                        "Only one of GOOGLE_CREDENTIALS / GOOGLE_SPREADSHEET_ID is set; \
                         storing submissions locally"
                    );
                }
                let path = var("INTAKE_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.into());
                RecordStoreConfig::LibSql {
                    path: PathBuf::from(path),
                }
            }
        };

        let defaults = FlowConfig::default();
        let flow = FlowConfig {
            intro_profiles: match var("INTAKE_INTRO_PROFILES") {
                Some(v) => parse_profiles(&v)?,
                None => defaults.intro_profiles,
            },
            date_validation: match var("INTAKE_DATE_VALIDATION") {
                Some(v) => parse_bool("INTAKE_DATE_VALIDATION", &v)?,
                None => defaults.date_validation,
            },
        };

        Ok(Self {
            telegram,
            cli_enabled,
            records,
            flow,
        })
    }
}

/// `GOOGLE_CREDENTIALS` holds either the key JSON itself or a path to it.
fn load_credentials(value: &str) -> Result<String, ConfigError> {
    if value.starts_with('{') {
        return Ok(value.to_string());
    }
    std::fs::read_to_string(value).map_err(|e| ConfigError::InvalidValue {
        key: "GOOGLE_CREDENTIALS".into(),
        message: format!("cannot read {value}: {e}"),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got {value:?}"),
        }),
    }
}

fn parse_profiles(value: &str) -> Result<Vec<Profile>, ConfigError> {
    split_list(value)
        .iter()
        .map(|code| {
            Profile::from_code(code).ok_or_else(|| ConfigError::InvalidValue {
                key: "INTAKE_INTRO_PROFILES".into(),
                message: format!("unknown profile {code:?}"),
            })
        })
        .collect()
}
