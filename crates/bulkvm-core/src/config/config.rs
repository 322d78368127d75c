//! Profile-based configuration
//!
//! Profiles name a project plus default scope and credentials for one
//! deployment. Values may reference environment variables with
//! `${VAR}` syntax; expansion happens at resolution time, never at
//! save time, so secrets stay out of the config file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ConfigError, Result};

/// One named deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Project the API calls are billed against.
    pub project: String,
    /// Default zone for zonal calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Default region for regional calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// API endpoint override; the production endpoint when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Bearer token, usually `${SOME_VAR}` rather than a literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Profile {
    /// Token with `${VAR}` references expanded from the environment.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .as_deref()
            .map(|raw| shellexpand::env(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned()))
    }

    /// API URL with `${VAR}` references expanded.
    pub fn resolve_api_url(&self) -> Option<String> {
        self.api_url
            .as_deref()
            .map(|raw| shellexpand::env(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned()))
    }
}

/// On-disk configuration: named profiles plus an optional default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

impl Config {
    /// Platform config file location, e.g.
    /// `~/.config/bulkvm/config.toml` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "bulkvm", "bulkvm")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from the platform location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Load from an explicit path. A missing file yields a default
    /// (empty) configuration; a present but malformed file is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to the platform location, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::default_path()?)
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve a profile name: explicit choice, else the configured
    /// default, else - when exactly one profile exists - that one.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&str> {
        if let Some(name) = name {
            return self
                .profiles
                .get_key_value(name)
                .map(|(key, _)| key.as_str())
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                });
        }
        if let Some(default) = &self.default_profile {
            return if self.profiles.contains_key(default) {
                Ok(default.as_str())
            } else {
                Err(ConfigError::ProfileNotFound {
                    name: default.clone(),
                })
            };
        }
        if self.profiles.len() == 1 {
            return Ok(self
                .profiles
                .keys()
                .next()
                .map(String::as_str)
                .unwrap_or_default());
        }
        Err(ConfigError::NoProfileConfigured)
    }

    /// The profile resolved by [`Config::resolve_profile`].
    pub fn profile(&self, name: Option<&str>) -> Result<&Profile> {
        let resolved = self.resolve_profile(name)?;
        self.profiles
            .get(resolved)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: resolved.to_string(),
            })
    }

    pub fn set_profile(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Remove a profile; clears the default if it pointed at it.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let removed = self.profiles.remove(name).is_some();
        if removed && self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        removed
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        self.default_profile = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(project: &str) -> Profile {
        Profile {
            project: project.to_string(),
            zone: Some("us-west1-a".to_string()),
            region: None,
            api_url: None,
            token: None,
        }
    }

    #[test]
    fn explicit_name_wins() {
        let mut config = Config::default();
        config.set_profile("dev", profile("dev-project"));
        config.set_profile("prod", profile("prod-project"));
        config.default_profile = Some("prod".to_string());

        assert_eq!(config.resolve_profile(Some("dev")).unwrap(), "dev");
        assert_eq!(config.resolve_profile(None).unwrap(), "prod");
    }

    #[test]
    fn single_profile_is_implicit_default() {
        let mut config = Config::default();
        config.set_profile("only", profile("p"));
        assert_eq!(config.resolve_profile(None).unwrap(), "only");
    }

    #[test]
    fn missing_profile_errors() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_profile(Some("nope")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
        assert!(matches!(
            config.resolve_profile(None),
            Err(ConfigError::NoProfileConfigured)
        ));
    }

    #[test]
    fn removing_default_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("a", profile("p"));
        config.set_default("a").unwrap();
        assert!(config.remove_profile("a"));
        assert!(config.default_profile.is_none());
        assert!(!config.remove_profile("a"));
    }

    #[test]
    #[serial_test::serial]
    fn token_env_expansion() {
        let mut p = profile("p");
        p.token = Some("${BULKVM_TEST_TOKEN_VALUE}".to_string());
        // Variable unset: the raw string is kept rather than erroring.
        let raw = p.resolve_token().unwrap();
        assert!(raw.contains("BULKVM_TEST_TOKEN_VALUE"));

        // SAFETY: test-local variable, no other thread depends on it.
        unsafe { std::env::set_var("BULKVM_TEST_TOKEN_VALUE", "sekrit") };
        assert_eq!(p.resolve_token().unwrap(), "sekrit");
        unsafe { std::env::remove_var("BULKVM_TEST_TOKEN_VALUE") };
    }
}
