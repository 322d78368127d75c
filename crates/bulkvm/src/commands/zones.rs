//! Zone command handlers

use bulkvm_core::compute::ZoneHandler;

use crate::cli::ZoneCommands;
use crate::connection::ConnectionManager;
use crate::error::{BulkVmError, Result as CliResult};
use crate::output::{print_output, OutputFormat};

pub async fn handle_zone_command(
    command: &ZoneCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let target = conn_mgr.resolve_target(profile_name)?;

    match command {
        ZoneCommands::List { region } => {
            let region = target.region_name(region.as_deref())?;
            let client = conn_mgr.create_client(&target)?;
            let zones = ZoneHandler::new(client)
                .list_in_region(&target.project, &region)
                .await
                .map_err(BulkVmError::from)?;
            print_output(zones, output_format)?;
            Ok(())
        }
    }
}
