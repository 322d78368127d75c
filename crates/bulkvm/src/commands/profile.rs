//! Profile management command handlers

use serde_json::json;

use bulkvm_core::{Config, Profile};

use crate::cli::ProfileCommands;
use crate::connection::ConnectionManager;
use crate::error::{BulkVmError, Result as CliResult};
use crate::output::{print_output, OutputFormat};

pub async fn handle_profile_command(
    command: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> CliResult<()> {
    match command {
        ProfileCommands::List => list_profiles(conn_mgr, output_format),
        ProfileCommands::Path => {
            let path = match &conn_mgr.config_path {
                Some(path) => path.clone(),
                None => Config::default_path().map_err(BulkVmError::from)?,
            };
            println!("{}", path.display());
            Ok(())
        }
        ProfileCommands::Show { name } => show_profile(conn_mgr, name, output_format),
        ProfileCommands::Set {
            name,
            project,
            zone,
            region,
            api_url,
            token,
        } => {
            let mut conn_mgr = conn_mgr.clone();
            conn_mgr.config.set_profile(
                name.clone(),
                Profile {
                    project: project.clone(),
                    zone: zone.clone(),
                    region: region.clone(),
                    api_url: api_url.clone(),
                    token: token.clone(),
                },
            );
            conn_mgr.save_config()?;
            println!("Profile '{name}' saved");
            Ok(())
        }
        ProfileCommands::Remove { name } => {
            let mut conn_mgr = conn_mgr.clone();
            if !conn_mgr.config.remove_profile(name) {
                return Err(BulkVmError::ProfileNotFound { name: name.clone() });
            }
            conn_mgr.save_config()?;
            println!("Profile '{name}' removed");
            Ok(())
        }
        ProfileCommands::Default { name } => {
            let mut conn_mgr = conn_mgr.clone();
            conn_mgr.config.set_default(name)?;
            conn_mgr.save_config()?;
            println!("Default profile set to '{name}'");
            Ok(())
        }
    }
}

fn list_profiles(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> CliResult<()> {
    let default = conn_mgr.config.default_profile.as_deref();
    let rows: Vec<serde_json::Value> = conn_mgr
        .config
        .profiles
        .iter()
        .map(|(name, profile)| {
            json!({
                "name": name,
                "project": profile.project,
                "zone": profile.zone,
                "region": profile.region,
                "default": Some(name.as_str()) == default,
            })
        })
        .collect();

    if rows.is_empty() {
        println!("No profiles configured. Create one with 'bulkvm profile set'.");
        return Ok(());
    }
    print_output(rows, output_format)?;
    Ok(())
}

fn show_profile(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| BulkVmError::ProfileNotFound {
            name: name.to_string(),
        })?;

    // The token value is never printed, only whether one is set and
    // whether it is an environment reference.
    let token_display = profile.token.as_deref().map(redact_token);
    let value = json!({
        "name": name,
        "project": profile.project,
        "zone": profile.zone,
        "region": profile.region,
        "api_url": profile.api_url,
        "token": token_display,
    });
    print_output(value, output_format)?;
    Ok(())
}

fn redact_token(token: &str) -> String {
    if token.contains("${") {
        // Environment references carry no secret; show them verbatim.
        token.to_string()
    } else {
        "***".to_string()
    }
}
