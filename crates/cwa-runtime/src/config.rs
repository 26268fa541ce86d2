//! Host configuration from environment.

use anyhow::{Context, Result};
use cwa_core::WarningRules;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `Route{slot}.json` files
    pub routes_dir: PathBuf,
    /// Optional JSON file overriding the default warning rules
    pub rules_file: Option<PathBuf>,
    /// Host step override; when unset the rules' update interval applies
    pub tick_ms: Option<u64>,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            routes_dir: lookup("CWA_ROUTES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("routes")),
            rules_file: lookup("CWA_RULES_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            tick_ms: lookup("CWA_TICK_MS")
                .and_then(|s| s.parse().ok())
                .filter(|&ms| ms > 0),
            log_json: lookup("CWA_LOG_JSON")
                .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Warning rules for this host.
    ///
    /// A missing or invalid rules file is logged and the defaults are used.
    pub fn load_rules(&self) -> WarningRules {
        let mut rules = match &self.rules_file {
            Some(_) => self.read_rules_file().unwrap_or_else(|e| {
                tracing::warn!("Using default warning rules: {:#}", e);
                WarningRules::default()
            }),
            None => WarningRules::default(),
        };
        if let Some(tick_ms) = self.tick_ms {
            rules.update_interval_ms = tick_ms;
        }
        rules
    }

    fn read_rules_file(&self) -> Result<WarningRules> {
        let path = self
            .rules_file
            .as_ref()
            .context("no rules file configured")?;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file {}", path.display()))?;
        WarningRules::from_json(&raw)
            .with_context(|| format!("invalid rules file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.routes_dir, PathBuf::from("routes"));
        assert!(config.rules_file.is_none());
        assert!(config.tick_ms.is_none());
        assert!(!config.log_json);
        assert_eq!(config.load_rules(), WarningRules::default());
    }

    #[test]
    fn tick_override_applies_to_rules() {
        let config = config(&[("CWA_TICK_MS", "20"), ("CWA_LOG_JSON", "true")]);
        assert_eq!(config.tick_ms, Some(20));
        assert!(config.log_json);
        assert_eq!(config.load_rules().update_interval_ms, 20);
    }

    #[test]
    fn invalid_tick_is_ignored() {
        assert!(config(&[("CWA_TICK_MS", "0")]).tick_ms.is_none());
        assert!(config(&[("CWA_TICK_MS", "fast")]).tick_ms.is_none());
    }

    #[test]
    fn unreadable_rules_file_falls_back_to_defaults() {
        let config = config(&[("CWA_RULES_FILE", "/nonexistent/cwa-rules.json")]);
        assert_eq!(config.load_rules(), WarningRules::default());
    }
}
