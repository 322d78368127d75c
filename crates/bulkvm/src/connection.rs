//! Connection management: resolve profile and environment into a client

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};

use bulkvm_core::compute::types::Scope;
use bulkvm_core::compute::{ComputeClient, DEFAULT_API_URL};
use bulkvm_core::Config;

use crate::error::{BulkVmError, Result as CliResult};

/// User agent string for bulkvm HTTP requests
const BULKVM_USER_AGENT: &str = concat!("bulkvm/", env!("CARGO_PKG_VERSION"));

/// The target a command runs against, after profile and environment
/// resolution. Scope fields stay optional; commands demand the ones
/// they need.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub project: String,
    pub zone: Option<String>,
    pub region: Option<String>,
    pub api_url: String,
    pub token: String,
}

impl ResolvedTarget {
    /// Zonal scope from an explicit flag, falling back to the profile
    /// default zone.
    pub fn zonal_scope(&self, zone_flag: Option<&str>) -> CliResult<Scope> {
        let zone = zone_flag
            .map(str::to_string)
            .or_else(|| self.zone.clone())
            .ok_or(BulkVmError::MissingScopeField { field: "zone" })?;
        Ok(Scope::zonal(&self.project, zone))
    }

    /// Regional scope from an explicit flag, falling back to the profile
    /// default region.
    pub fn regional_scope(&self, region_flag: Option<&str>) -> CliResult<Scope> {
        let region = self.region_name(region_flag)?;
        Ok(Scope::regional(&self.project, region))
    }

    /// Scope from `--zone`/`--region` flags: an explicit region wins,
    /// then an explicit zone, then the profile defaults in that order.
    pub fn scope(&self, zone_flag: Option<&str>, region_flag: Option<&str>) -> CliResult<Scope> {
        if region_flag.is_some() {
            return self.regional_scope(region_flag);
        }
        if zone_flag.is_some() || self.zone.is_some() {
            return self.zonal_scope(zone_flag);
        }
        self.regional_scope(None)
    }

    pub fn region_name(&self, region_flag: Option<&str>) -> CliResult<String> {
        region_flag
            .map(str::to_string)
            .or_else(|| self.region.clone())
            .ok_or(BulkVmError::MissingScopeField { field: "region" })
    }
}

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration back to where it was loaded from.
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(path) = &self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve the target for a command, merging profile values with
    /// `BULKVM_*` environment overrides.
    ///
    /// When --config-file is explicitly specified, environment variables
    /// are ignored so the named file fully determines the target. This
    /// gives tests true configuration isolation and follows the
    /// "explicit wins" rule (CLI args > env vars > defaults).
    pub fn resolve_target(&self, profile_name: Option<&str>) -> CliResult<ResolvedTarget> {
        let use_env = self.config_path.is_none();
        if !use_env {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env = |name: &str| -> Option<String> {
            if use_env { std::env::var(name).ok() } else { None }
        };

        let env_project = env("BULKVM_PROJECT");
        let env_zone = env("BULKVM_ZONE");
        let env_region = env("BULKVM_REGION");
        let env_api_url = env("BULKVM_API_URL");
        let env_token = env("BULKVM_TOKEN");

        // A complete environment needs no profile at all.
        if let (Some(project), Some(token)) = (&env_project, &env_token) {
            info!("using project and token from environment variables");
            return Ok(ResolvedTarget {
                project: project.clone(),
                zone: env_zone,
                region: env_region,
                api_url: env_api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                token: token.clone(),
            });
        }

        let resolved_name = self.config.resolve_profile(profile_name)?.to_string();
        debug!(profile = %resolved_name, "resolved profile");
        let profile = self.config.profile(Some(&resolved_name))?;

        let token = env_token
            .or_else(|| profile.resolve_token())
            .ok_or(BulkVmError::MissingCredentials {
                name: resolved_name.clone(),
            })?;

        Ok(ResolvedTarget {
            project: env_project.unwrap_or_else(|| profile.project.clone()),
            zone: env_zone.or_else(|| profile.zone.clone()),
            region: env_region.or_else(|| profile.region.clone()),
            api_url: env_api_url
                .or_else(|| profile.resolve_api_url())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token,
        })
    }

    /// An authenticated compute client for the resolved target.
    pub fn create_client(&self, target: &ResolvedTarget) -> CliResult<ComputeClient> {
        debug!(api_url = %target.api_url, "creating compute client");
        ComputeClient::builder()
            .base_url(&target.api_url)
            .token(&target.token)
            .user_agent(BULKVM_USER_AGENT)
            .build()
            .map_err(BulkVmError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkvm_core::Profile;

    fn manager_with_profile() -> ConnectionManager {
        let mut config = Config::default();
        config.set_profile(
            "dev",
            Profile {
                project: "dev-project".to_string(),
                zone: Some("us-west1-a".to_string()),
                region: Some("us-west1".to_string()),
                api_url: None,
                token: Some("literal-token".to_string()),
            },
        );
        // Explicit config path keeps the environment out of these tests.
        ConnectionManager::with_config_path(config, Some(PathBuf::from("/tmp/unused.toml")))
    }

    #[test]
    fn profile_defaults_flow_into_target() {
        let target = manager_with_profile().resolve_target(Some("dev")).unwrap();
        assert_eq!(target.project, "dev-project");
        assert_eq!(target.zone.as_deref(), Some("us-west1-a"));
        assert_eq!(target.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn scope_prefers_explicit_region_over_default_zone() {
        let target = manager_with_profile().resolve_target(Some("dev")).unwrap();

        let scope = target.scope(None, Some("europe-west4")).unwrap();
        assert_eq!(scope.location(), "europe-west4");

        // No flags: the default zone wins over the default region.
        let scope = target.scope(None, None).unwrap();
        assert_eq!(scope.location(), "us-west1-a");
    }

    #[test]
    fn missing_zone_is_a_scope_error() {
        let mut manager = manager_with_profile();
        if let Some(profile) = manager.config.profiles.get_mut("dev") {
            profile.zone = None;
        }
        let target = manager.resolve_target(Some("dev")).unwrap();
        assert!(matches!(
            target.zonal_scope(None),
            Err(BulkVmError::MissingScopeField { field: "zone" })
        ));
    }

    #[test]
    fn missing_token_is_missing_credentials() {
        let mut manager = manager_with_profile();
        if let Some(profile) = manager.config.profiles.get_mut("dev") {
            profile.token = None;
        }
        assert!(matches!(
            manager.resolve_target(Some("dev")),
            Err(BulkVmError::MissingCredentials { .. })
        ));
    }
}
