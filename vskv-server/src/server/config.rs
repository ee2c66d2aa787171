//! Service configuration: CLI flags merged over an optional TOML file.
//!
//! Grounded on `kv-cli/src/server/config.rs`'s `ConfigLoad` pattern
//! (fallible load, explicit field-by-field override) -- narrowed from the
//! REPL's many display/formatting toggles to the handful of settings a
//! service binary needs.

use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:7878";
pub const DEFAULT_VALUE_STORE: &str = "127.0.0.1:7879";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Option<String>,
    pub bootstrap: Option<bool>,
    pub value_store: Option<String>,
    pub listen: Option<String>,
    pub log_level: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            name: None,
            bootstrap: Some(false),
            value_store: Some(DEFAULT_VALUE_STORE.to_string()),
            listen: Some(DEFAULT_LISTEN.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}

impl ServerConfig {
    /// Loads a config file at `path` via `confy`, falling back to defaults
    /// if the file doesn't exist or can't be parsed.
    pub fn load(path: &str) -> Self {
        match confy::load_path::<ServerConfig>(path) {
            Ok(cfg) => cfg,
            Err(_) => ServerConfig::default(),
        }
    }

    /// Overlays any explicitly-given CLI flags on top of the loaded file,
    /// so a flag on the command line always wins.
    pub fn merge_cli(mut self, overrides: ServerConfig) -> Self {
        if overrides.name.is_some() {
            self.name = overrides.name;
        }
        if overrides.bootstrap.is_some() {
            self.bootstrap = overrides.bootstrap;
        }
        if overrides.value_store.is_some() {
            self.value_store = overrides.value_store;
        }
        if overrides.listen.is_some() {
            self.listen = overrides.listen;
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level;
        }
        self
    }

    pub fn listen(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }

    pub fn value_store(&self) -> &str {
        self.value_store.as_deref().unwrap_or(DEFAULT_VALUE_STORE)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap.unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen(), DEFAULT_LISTEN);
        assert!(!cfg.bootstrap());
    }

    #[test]
    fn merge_cli_overrides_only_given_fields() {
        let base = ServerConfig::default();
        let overrides = ServerConfig {
            name: Some("svc".to_string()),
            bootstrap: None,
            value_store: None,
            listen: Some("0.0.0.0:9000".to_string()),
            log_level: None,
        };
        let merged = base.merge_cli(overrides);
        assert_eq!(merged.name.as_deref(), Some("svc"));
        assert_eq!(merged.listen(), "0.0.0.0:9000");
        assert_eq!(merged.log_level(), DEFAULT_LOG_LEVEL);
    }
}
