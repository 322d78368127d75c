//! CLI structure and command definitions

use clap::{Parser, Subcommand};

use crate::commands::async_utils::AsyncOperationArgs;
use crate::output::OutputFormat;

/// Bulk VM provisioning CLI
#[derive(Parser, Debug)]
#[command(name = "bulkvm")]
#[command(version, about = "Bulk virtual-machine provisioning CLI")]
#[command(long_about = "
Bulk virtual-machine provisioning CLI

Create many instances with one API call, then resolve the resulting
operation to its terminal outcome:

    bulkvm instances bulk-create --count 10 --name-pattern 'vm-###' --wait
    bulkvm operations wait operation-1234
    bulkvm instances list

EXAMPLES:
    # Configure a profile
    bulkvm profile set prod --project my-project --zone us-west1-a \\
        --token '${BULKVM_TOKEN}'

    # Create 50 instances spread across a region's zones
    bulkvm instances bulk-create --region us-west1 --spread \\
        --count 50 --name-pattern 'worker-###' --wait

    # JSON output for scripting
    bulkvm zones list --region us-west1 -o json

For more help on a specific command, run:
    bulkvm <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "BULKVM_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "BULKVM_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Instance operations
    #[command(subcommand, visible_alias = "inst", visible_alias = "i")]
    Instances(InstanceCommands),

    /// Operation status queries
    #[command(subcommand, visible_alias = "ops", visible_alias = "op")]
    Operations(OperationCommands),

    /// Zone discovery
    #[command(subcommand, visible_alias = "z")]
    Zones(ZoneCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,
}

/// Instance commands
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// Create many instances with a single bulk request
    #[command(name = "bulk-create", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Ten instances named from a pattern, waiting for the outcome
    bulkvm instances bulk-create --count 10 --name-pattern 'vm-###' --wait

    # Explicit names
    bulkvm instances bulk-create --name vm-a --name vm-b --wait

    # Regional placement, provider picks the zones
    bulkvm instances bulk-create --region us-west1 --count 10 \\
        --name-pattern 'vm-###' --wait

    # Spread across a region's zones, taking what each zone can give
    bulkvm instances bulk-create --region us-west1 --spread --count 50 \\
        --name-pattern 'worker-###' --wait

    # Fall back across machine families when capacity is tight
    bulkvm instances bulk-create --count 4 --name-pattern 'vm-###' \\
        --machine-type c2-standard-4 --fallback-machine-type n2-standard-4 \\
        --fallback-machine-type e2-standard-4 --wait
")]
    BulkCreate {
        /// Number of instances to create (defaults to the number of --name args)
        #[arg(long)]
        count: Option<u64>,

        /// Minimum acceptable number of created instances (0 = best effort)
        #[arg(long)]
        min_count: Option<u64>,

        /// Explicit instance name (repeatable; conflicts with --name-pattern)
        #[arg(long, conflicts_with = "name_pattern")]
        name: Vec<String>,

        /// Name pattern with a '#' run for the index, e.g. 'vm-###'
        #[arg(long)]
        name_pattern: Option<String>,

        /// Machine type, e.g. n2-standard-2
        #[arg(long, default_value = "n2-standard-2")]
        machine_type: String,

        /// Additional machine types to fall back to on capacity exhaustion
        #[arg(long = "fallback-machine-type")]
        fallback_machine_types: Vec<String>,

        /// Source image or image family link
        #[arg(
            long,
            default_value = "projects/debian-cloud/global/images/family/debian-12"
        )]
        image: String,

        /// Network name
        #[arg(long, default_value = "default")]
        network: String,

        /// Zone for zonal placement (overrides the profile default)
        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,

        /// Region for regional placement
        #[arg(long)]
        region: Option<String>,

        /// Spread the request across the region's zones (requires --region)
        #[arg(long, requires = "region")]
        spread: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// List instances in the target scope
    #[command(visible_alias = "ls")]
    List {
        /// Only instances with one of these names
        #[arg(long)]
        name: Vec<String>,

        /// Zone to list in (overrides the profile default)
        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,

        /// Region to list in
        #[arg(long)]
        region: Option<String>,
    },
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Show the current status of an operation
    Get {
        /// Operation name
        name: String,

        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,

        #[arg(long)]
        region: Option<String>,
    },

    /// Poll an operation until it reaches a terminal status
    Wait {
        /// Operation name
        name: String,

        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,

        #[arg(long)]
        region: Option<String>,

        /// Maximum time to wait in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,

        /// Polling interval in seconds
        #[arg(long, default_value = "2")]
        interval: u64,

        /// Also wait on the per-instance operations spawned by this one
        #[arg(long)]
        per_instance: bool,
    },

    /// List operations in the target scope
    #[command(visible_alias = "ls")]
    List {
        /// Filter expression, e.g. 'clientOperationId = "op-1"'
        #[arg(long)]
        filter: Option<String>,

        #[arg(long, conflicts_with = "region")]
        zone: Option<String>,

        #[arg(long)]
        region: Option<String>,
    },
}

/// Zone commands
#[derive(Subcommand, Debug)]
pub enum ZoneCommands {
    /// List the zones of a region, sorted by name
    #[command(visible_alias = "ls")]
    List {
        /// Region to list zones for (overrides the profile default)
        #[arg(long)]
        region: Option<String>,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Token read from the environment at call time, never stored expanded
    bulkvm profile set prod --project my-project --zone us-west1-a \\
        --token '${BULKVM_TOKEN}'

    # Regional default plus a private API endpoint
    bulkvm profile set staging --project staging-project \\
        --region us-west1 --api-url https://compute.internal/compute/v1
")]
    Set {
        /// Profile name
        name: String,

        /// Project the API calls are billed against
        #[arg(long)]
        project: String,

        /// Default zone for zonal commands
        #[arg(long)]
        zone: Option<String>,

        /// Default region for regional commands
        #[arg(long)]
        region: Option<String>,

        /// API endpoint override
        #[arg(long)]
        api_url: Option<String>,

        /// Bearer token, ideally an '${ENV_VAR}' reference
        #[arg(long)]
        token: Option<String>,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to make the default
        name: String,
    },
}
