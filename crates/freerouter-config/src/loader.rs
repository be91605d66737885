use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::provider::split_model_id;
use crate::{Config, env};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "FREEROUTER_CONFIG";

/// Config file name searched in the working directory
const LOCAL_CONFIG: &str = "freerouter.config.json";

impl Config {
    /// Locate and load the configuration
    ///
    /// Search order: `FREEROUTER_CONFIG`, `./freerouter.config.json`,
    /// `~/.config/freerouter/config.json`. When nothing is found the
    /// built-in defaults are used.
    ///
    /// Returns the config and the path it was loaded from, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovered file cannot be read, parsed,
    /// expanded, or validated.
    pub fn discover() -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, Some(path)));
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join("freerouter").join("config.json");
            if user.is_file() {
                return Ok((Self::load(&user)?, Some(user)));
            }
        }

        let config = Self::default();
        config.validate()?;
        Ok((config, None))
    }

    /// Load configuration from a JSON file
    ///
    /// Reads the file, substitutes `$VAR` references and `~/` in string
    /// values, deep-merges the result into the built-in defaults, then
    /// deserializes and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a referenced
    /// environment variable is unset, JSON parsing fails, or validation
    /// fails.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let mut user: Value =
            serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        env::expand_values(&mut user).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let mut base = serde_json::to_value(Self::default()).expect("default config serializes");
        deep_merge(&mut base, user);

        let config: Self =
            serde_json::from_value(base).map_err(|e| anyhow::anyhow!("invalid config structure: {e}"))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// Every tier primary and fallback in both tier tables must resolve to
    /// a configured provider, and the scoring boundaries must be ordered.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> anyhow::Result<()> {
        let scoring = self.effective_scoring();
        let [b1, b2, b3] = scoring.boundaries.as_array();
        if b1 >= b2 || b2 >= b3 {
            anyhow::bail!("tier boundaries must be strictly ascending: {b1} < {b2} < {b3} required");
        }

        for (label, table) in [("tiers", Some(&self.tiers)), ("agenticTiers", self.agentic_tiers.as_ref())] {
            let Some(table) = table else { continue };
            for (tier, entry) in table.entries() {
                if entry.primary.is_empty() {
                    anyhow::bail!("{label}.{tier}: primary model must not be empty");
                }
                for model in std::iter::once(&entry.primary).chain(&entry.fallback) {
                    let (provider, _) = split_model_id(model);
                    if !self.providers.contains_key(provider) {
                        anyhow::bail!("{label}.{tier}: model '{model}' references unknown provider '{provider}'");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Merge `overlay` into `base`
///
/// Objects merge recursively; arrays and scalars replace.
fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_replaces_arrays() {
        let mut base = json!({"tiers": {"simple": {"fallback": ["a/x", "a/y"]}}, "port": 1});
        deep_merge(&mut base, json!({"tiers": {"simple": {"fallback": ["b/z"]}}}));
        assert_eq!(base["tiers"]["simple"]["fallback"], json!(["b/z"]));
        assert_eq!(base["port"], 1);
    }

    #[test]
    fn deep_merge_keeps_sibling_keys() {
        let mut base = json!({"scoring": {"sigmoidSteepness": 8.0, "confidenceThreshold": 0.5}});
        deep_merge(&mut base, json!({"scoring": {"sigmoidSteepness": 12.0}}));
        assert_eq!(base["scoring"]["sigmoidSteepness"], 12.0);
        assert_eq!(base["scoring"]["confidenceThreshold"], 0.5);
    }

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn unknown_provider_in_tier_table_fails_validation() {
        let mut config = Config::default();
        config.tiers.simple.primary = "nosuch/model".to_owned();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("nosuch"));
    }

    #[test]
    fn unordered_boundaries_fail_validation() {
        let mut config = Config::default();
        config.scoring.boundaries.medium_complex = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_file_merges_into_defaults() {
        let dir = std::env::temp_dir().join("freerouter-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("partial.json");
        std::fs::write(&path, r#"{"port": 9000, "scoring": {"confidenceThreshold": 0.6}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert!((config.scoring.confidence_threshold - 0.6).abs() < 1e-9);
        // untouched defaults survive
        assert!((config.scoring.sigmoid_steepness - 8.0).abs() < 1e-9);
    }

    #[test]
    fn env_reference_in_config_value() {
        temp_env::with_var("FR_LOADER_HOST", Some("0.0.0.0"), || {
            let dir = std::env::temp_dir().join("freerouter-config-test");
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("env.json");
            std::fs::write(&path, r#"{"host": "$FR_LOADER_HOST"}"#).unwrap();

            let config = Config::load(&path).unwrap();
            assert_eq!(config.host, "0.0.0.0");
        });
    }
}
