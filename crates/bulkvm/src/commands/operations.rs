//! Operation command handlers

use bulkvm_core::compute::OperationHandler;
use bulkvm_core::poller::poll_operation;
use bulkvm_core::workflows::wait_on_instance_operations;

use crate::cli::OperationCommands;
use crate::commands::async_utils::{
    cancel_on_ctrl_c, print_terminal_operation, spinner_progress, AsyncOperationArgs,
};
use crate::connection::ConnectionManager;
use crate::error::{BulkVmError, Result as CliResult};
use crate::output::{print_output, OutputFormat};

pub async fn handle_operation_command(
    command: &OperationCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let target = conn_mgr.resolve_target(profile_name)?;

    match command {
        OperationCommands::Get { name, zone, region } => {
            let scope = target.scope(zone.as_deref(), region.as_deref())?;
            let client = conn_mgr.create_client(&target)?;
            let operation = OperationHandler::new(client)
                .get(&scope, name)
                .await
                .map_err(BulkVmError::from)?;
            print_output(operation, output_format)?;
            Ok(())
        }

        OperationCommands::Wait {
            name,
            zone,
            region,
            timeout,
            interval,
            per_instance,
        } => {
            let scope = target.scope(zone.as_deref(), region.as_deref())?;
            let client = conn_mgr.create_client(&target)?;
            let async_ops = AsyncOperationArgs {
                wait: true,
                wait_timeout: *timeout,
                wait_interval: *interval,
            };
            let settings = async_ops.poll_settings();
            let cancel = cancel_on_ctrl_c();
            let (pb, callback) = spinner_progress(&format!("Waiting for operation {name}"));

            let operation =
                poll_operation(&client, &scope, name, &settings, &cancel, Some(&callback)).await;
            pb.finish_and_clear();
            let operation = operation?;
            print_terminal_operation(&operation, output_format)?;

            if *per_instance {
                let children =
                    wait_on_instance_operations(&client, &scope, name, &settings, &cancel).await?;
                match output_format {
                    OutputFormat::Auto | OutputFormat::Table => {
                        println!("{} per-instance operation(s) resolved:", children.len());
                        for child in &children {
                            print_terminal_operation(child, output_format)?;
                        }
                    }
                    OutputFormat::Json | OutputFormat::Yaml => {
                        print_output(children, output_format)?;
                    }
                }
            }
            Ok(())
        }

        OperationCommands::List {
            filter,
            zone,
            region,
        } => {
            let scope = target.scope(zone.as_deref(), region.as_deref())?;
            let client = conn_mgr.create_client(&target)?;
            let operations = OperationHandler::new(client)
                .list(&scope, filter.as_deref())
                .await
                .map_err(BulkVmError::from)?;
            print_output(operations, output_format)?;
            Ok(())
        }
    }
}
