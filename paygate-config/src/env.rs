// PAYGATE_* environment variables

use std::collections::HashMap;
use std::env;

/// Prefix shared by every paygate environment variable
pub const ENV_PREFIX: &str = "PAYGATE";

/// Collects prefixed variables as lowercased settings keys
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader scoped to `PAYGATE_*` variables
    pub fn paygate() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Load all matching variables, keys lowercased with the prefix stripped
    pub fn load(&self) -> HashMap<String, String> {
        Self::collect(self.prefix.as_deref(), env::vars())
    }

    fn collect(
        prefix: Option<&str>,
        vars: impl Iterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        let mut settings = HashMap::new();

        for (key, value) in vars {
            match prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix)
                        && let Some(trimmed_key) = rest.strip_prefix('_')
                    {
                        settings.insert(trimmed_key.to_lowercase(), value);
                    }
                }
                None => {
                    settings.insert(key.to_lowercase(), value);
                }
            }
        }

        settings
    }

    /// Filter and normalize an explicit set of pairs, such as a parsed `.env` file
    pub fn collect_from(
        &self,
        vars: impl Iterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        Self::collect(self.prefix.as_deref(), vars)
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::paygate()
    }
}
