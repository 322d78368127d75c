use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulkvm_core::Config;

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::BulkVmError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load configuration from the explicit path or the default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!(path = %path.display(), "loading config from explicit path");
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("loading config from default location");
        (Config::load()?, None)
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins when set; otherwise the -v count picks the level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "bulkvm=warn,bulkvm_core=warn",
            1 => "bulkvm=info,bulkvm_core=info",
            2 => "bulkvm=debug,bulkvm_core=debug",
            _ => "bulkvm=trace,bulkvm_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), BulkVmError> {
    info!(command = %format_command(&cli.command), "executing");

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            match cli.output {
                output::OutputFormat::Json | output::OutputFormat::Yaml => {
                    let data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(data, cli.output)?;
                }
                _ => {
                    println!("bulkvm {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }

        Commands::Instances(cmd) => {
            commands::instances::handle_instance_command(
                cmd,
                conn_mgr,
                cli.profile.as_deref(),
                cli.output,
            )
            .await
        }

        Commands::Operations(cmd) => {
            commands::operations::handle_operation_command(
                cmd,
                conn_mgr,
                cli.profile.as_deref(),
                cli.output,
            )
            .await
        }

        Commands::Zones(cmd) => {
            commands::zones::handle_zone_command(cmd, conn_mgr, cli.profile.as_deref(), cli.output)
                .await
        }

        Commands::Profile(cmd) => {
            commands::profile::handle_profile_command(cmd, conn_mgr, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(()) => info!("command completed in {:?}", duration),
        Err(e) => error!("command failed after {:?}: {}", duration, e),
    }

    result
}

/// Human-readable command summary for logging, with credentials redacted
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Instances(cmd) => match cmd {
            cli::InstanceCommands::BulkCreate { .. } => "instances bulk-create".to_string(),
            cli::InstanceCommands::List { .. } => "instances list".to_string(),
        },
        Commands::Operations(cmd) => match cmd {
            cli::OperationCommands::Get { name, .. } => format!("operations get {name}"),
            cli::OperationCommands::Wait { name, .. } => format!("operations wait {name}"),
            cli::OperationCommands::List { .. } => "operations list".to_string(),
        },
        Commands::Zones(cmd) => match cmd {
            cli::ZoneCommands::List { .. } => "zones list".to_string(),
        },
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {name}"),
                Set { name, .. } => format!("profile set {name} [credentials redacted]"),
                Remove { name } => format!("profile remove {name}"),
                Default { name } => format!("profile default {name}"),
            }
        }
    }
}
