// Gateway settings

use crate::env::EnvLoader;
use crate::loader::ConfigLoader;
use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default provider call timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

fn secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(SecretString::new(value.into()))
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new().into())
}

/// Credentials of one CardPay terminal
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    pub terminal_id: String,

    /// Terminal password for the token endpoint
    #[serde(deserialize_with = "secret")]
    pub secret_word: SecretString,

    /// Key used to verify callback signatures
    #[serde(deserialize_with = "secret")]
    pub callback_secret_word: SecretString,
}

impl TerminalSettings {
    pub fn new(
        terminal_id: impl Into<String>,
        secret_word: impl Into<String>,
        callback_secret_word: impl Into<String>,
    ) -> Self {
        Self {
            terminal_id: terminal_id.into(),
            secret_word: SecretString::new(secret_word.into().into()),
            callback_secret_word: SecretString::new(callback_secret_word.into().into()),
        }
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            terminal_id: String::new(),
            secret_word: empty_secret(),
            callback_secret_word: empty_secret(),
        }
    }
}

/// CardPay terminals keyed by payment method external code (`BANKCARD`, `QIWI`, ...)
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct CardPaySettings {
    terminals: HashMap<String, TerminalSettings>,
}

impl CardPaySettings {
    /// Register the terminal serving `code`, replacing any previous one
    pub fn with_terminal(mut self, code: impl Into<String>, terminal: TerminalSettings) -> Self {
        self.terminals.insert(code.into(), terminal);
        self
    }

    /// Terminal serving a payment method external code
    pub fn terminal(&self, code: &str) -> Option<&TerminalSettings> {
        self.terminals.get(code)
    }

    pub fn terminals(&self) -> impl Iterator<Item = (&str, &TerminalSettings)> {
        self.terminals.iter().map(|(code, terminal)| (code.as_str(), terminal))
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    /// Apply a `<code>_<field>` key, e.g. `bankcard_terminal_id`
    fn apply_var(&mut self, key: &str, value: &str) {
        // callback_secret_word first: secret_word is its suffix
        let Some((field, code)) = ["callback_secret_word", "secret_word", "terminal_id"]
            .into_iter()
            .find_map(|field| Some((field, key.strip_suffix(field)?)))
        else {
            return;
        };
        let Some(code) = code.strip_suffix('_').filter(|code| !code.is_empty()) else {
            return;
        };

        let terminal = self.terminals.entry(code.to_uppercase()).or_default();
        match field {
            "terminal_id" => terminal.terminal_id = value.to_string(),
            "secret_word" => terminal.secret_word = SecretString::new(value.into()),
            _ => terminal.callback_secret_word = SecretString::new(value.into()),
        }
    }
}

/// Top-level gateway settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub http_timeout_secs: u64,

    /// Record request and response bodies in provider audit events
    pub audit_bodies: bool,

    /// Require a valid request signature on incoming orders
    pub order_signature_required: bool,

    pub cardpay: CardPaySettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            audit_bodies: true,
            order_signature_required: false,
            cardpay: CardPaySettings::default(),
        }
    }
}

impl GatewaySettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Parse settings from a JSON or TOML tree
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Override fields from flattened, lowercased `key => value` pairs
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "http_timeout_secs" => {
                    self.http_timeout_secs =
                        value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                            key: key.clone(),
                            message: format!("expected seconds, got '{}'", value),
                        })?;
                }
                "audit_bodies" => self.audit_bodies = parse_bool(key, value)?,
                "order_signature_required" => {
                    self.order_signature_required = parse_bool(key, value)?
                }
                other => {
                    if let Some(rest) = other.strip_prefix("cardpay_") {
                        self.cardpay.apply_var(rest, value);
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", value),
        }),
    }
}

impl Validate for GatewaySettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::in_range(self.http_timeout_secs, 1, 300, "http_timeout_secs")?;
        if self.cardpay.is_empty() {
            return Err(ConfigError::Invalid(
                "cardpay must configure at least one terminal".into(),
            ));
        }
        for (code, terminal) in self.cardpay.terminals() {
            ConfigValidator::not_empty(
                &terminal.terminal_id,
                &format!("cardpay.{}.terminal_id", code),
            )?;
            ConfigValidator::not_empty(
                terminal.secret_word.expose_secret(),
                &format!("cardpay.{}.secret_word", code),
            )?;
            ConfigValidator::not_empty(
                terminal.callback_secret_word.expose_secret(),
                &format!("cardpay.{}.callback_secret_word", code),
            )?;
        }
        Ok(())
    }
}

/// Layers settings sources: defaults, then a file, then `.env`, then the process environment
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    dotenv: Option<PathBuf>,
    env: Option<EnvLoader>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_dotenv(mut self, path: impl AsRef<Path>) -> Self {
        self.dotenv = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self, loader: EnvLoader) -> Self {
        self.env = Some(loader);
        self
    }

    /// Load, merge and validate
    pub fn load(&self) -> Result<GatewaySettings> {
        let mut settings = match &self.file {
            Some(path) => GatewaySettings::from_value(ConfigLoader::auto(path)?.load_file(path)?)?,
            None => GatewaySettings::default(),
        };

        if let Some(path) = &self.dotenv {
            let entries = dotenvy::from_path_iter(path)
                .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::Malformed(format!("{}: {}", path.display(), e)))?;
            let prefix = self.env.clone().unwrap_or_default();
            settings.apply_env(&prefix.collect_from(entries.into_iter()))?;
        }

        if let Some(env) = &self.env {
            settings.apply_env(&env.load())?;
        }

        settings.validate()?;
        Ok(settings)
    }
}
