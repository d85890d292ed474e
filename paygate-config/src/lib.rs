// Settings loading for the paygate billing gateway

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{
    CardPaySettings, DEFAULT_HTTP_TIMEOUT_SECS, GatewaySettings, SettingsLoader, TerminalSettings,
};
pub use validation::{ConfigValidator, Validate};
