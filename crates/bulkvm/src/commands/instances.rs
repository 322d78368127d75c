//! Instance command handlers: bulk creation and listing

use tracing::{debug, info};

use bulkvm_core::compute::types::{
    zonal_machine_type, BulkInsertRequest, InstanceTemplate, Scope,
};
use bulkvm_core::compute::{name_filter, InstanceHandler};
use bulkvm_core::workflows::{
    create_instances_and_wait, create_instances_in_region_and_wait, create_spread_across_zones,
    create_with_machine_family_fallback, ZoneSelection,
};

use crate::cli::InstanceCommands;
use crate::commands::async_utils::{
    cancel_on_ctrl_c, print_submitted_operation, print_terminal_operation, spinner_progress,
    AsyncOperationArgs,
};
use crate::connection::{ConnectionManager, ResolvedTarget};
use crate::error::{BulkVmError, Result as CliResult};
use crate::output::{print_output, OutputFormat};

pub async fn handle_instance_command(
    command: &InstanceCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let target = conn_mgr.resolve_target(profile_name)?;

    match command {
        InstanceCommands::BulkCreate {
            count,
            min_count,
            name,
            name_pattern,
            machine_type,
            fallback_machine_types,
            image,
            network,
            zone,
            region,
            spread,
            async_ops,
        } => {
            let params = BulkCreateParams {
                count: *count,
                min_count: *min_count,
                names: name.clone(),
                name_pattern: name_pattern.clone(),
                machine_type: machine_type.clone(),
                fallback_machine_types: fallback_machine_types.clone(),
                image: image.clone(),
                network: network.clone(),
            };
            if *spread {
                let region = target.region_name(region.as_deref())?;
                bulk_create_spread(conn_mgr, &target, &region, &params, async_ops, output_format)
                    .await
            } else {
                let scope = target.scope(zone.as_deref(), region.as_deref())?;
                bulk_create(conn_mgr, &target, &scope, &params, async_ops, output_format).await
            }
        }

        InstanceCommands::List { name, zone, region } => {
            let scope = target.scope(zone.as_deref(), region.as_deref())?;
            let client = conn_mgr.create_client(&target)?;
            let filter = if name.is_empty() {
                None
            } else {
                Some(name_filter(name))
            };
            let instances = InstanceHandler::new(client)
                .list(&scope, filter.as_deref())
                .await
                .map_err(BulkVmError::from)?;
            print_output(instances, output_format)?;
            Ok(())
        }
    }
}

struct BulkCreateParams {
    count: Option<u64>,
    min_count: Option<u64>,
    names: Vec<String>,
    name_pattern: Option<String>,
    machine_type: String,
    fallback_machine_types: Vec<String>,
    image: String,
    network: String,
}

/// How the created instances get their names, validated once up front so
/// request construction inside retry loops is infallible.
enum Naming {
    Names(Vec<String>),
    Pattern { pattern: String, count: u64 },
}

impl BulkCreateParams {
    fn naming(&self) -> CliResult<Naming> {
        if !self.names.is_empty() {
            return Ok(Naming::Names(self.names.clone()));
        }
        if let Some(pattern) = &self.name_pattern {
            let count = self.count.ok_or(BulkVmError::InvalidInput {
                message: "--count is required with --name-pattern".to_string(),
            })?;
            return Ok(Naming::Pattern {
                pattern: pattern.clone(),
                count,
            });
        }
        Err(BulkVmError::InvalidInput {
            message: "give either --name (repeatable) or --name-pattern".to_string(),
        })
    }

    fn build(&self, naming: &Naming, scope: &Scope, machine_type: &str) -> BulkInsertRequest {
        let template = self.template(scope, machine_type);
        let mut request = match naming {
            Naming::Names(names) => BulkInsertRequest::with_names(names.clone(), template),
            Naming::Pattern { pattern, count } => {
                BulkInsertRequest::with_pattern(pattern.clone(), *count, template)
            }
        };
        if let Some(min_count) = self.min_count {
            request = request.with_min_count(min_count);
        }
        request
    }

    fn template(&self, scope: &Scope, machine_type: &str) -> InstanceTemplate {
        let machine_link = match scope {
            Scope::Zonal { project, zone } => zonal_machine_type(project, zone, machine_type),
            // Regional requests carry the bare type; the provider
            // resolves it per chosen zone.
            Scope::Regional { .. } => machine_type.to_string(),
        };
        InstanceTemplate::new(machine_link, self.image.clone(), self.network.clone())
    }
}

async fn bulk_create(
    conn_mgr: &ConnectionManager,
    target: &ResolvedTarget,
    scope: &Scope,
    params: &BulkCreateParams,
    async_ops: &AsyncOperationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    let client = conn_mgr.create_client(target)?;
    let naming = params.naming()?;

    if !async_ops.wait {
        let request = params.build(&naming, scope, &params.machine_type);
        let operation = InstanceHandler::new(client)
            .bulk_insert(scope, &request)
            .await
            .map_err(BulkVmError::from)?;
        return print_submitted_operation(&operation, output_format);
    }

    let settings = async_ops.poll_settings();
    let cancel = cancel_on_ctrl_c();
    let (pb, callback) = spinner_progress("Creating instances");

    if !params.fallback_machine_types.is_empty() {
        let mut families = vec![params.machine_type.clone()];
        families.extend(params.fallback_machine_types.iter().cloned());
        info!(?families, "bulk create with machine family fallback");

        let operation = create_with_machine_family_fallback(
            &client,
            scope,
            &families,
            |family| params.build(&naming, scope, family),
            &settings,
            &cancel,
            Some(&callback),
        )
        .await;
        pb.finish_and_clear();
        let operation = operation?;
        return print_terminal_operation(&operation, output_format);
    }

    let request = params.build(&naming, scope, &params.machine_type);
    let outcome = match scope {
        Scope::Zonal { .. } => {
            create_instances_and_wait(&client, scope, &request, &settings, &cancel, Some(&callback))
                .await
        }
        Scope::Regional { project, region } => {
            create_instances_in_region_and_wait(
                &client,
                project,
                region,
                &request,
                &ZoneSelection::default(),
                &settings,
                &cancel,
                Some(&callback),
            )
            .await
        }
    };
    pb.finish_and_clear();
    let outcome = outcome?;

    debug!(
        operation = %outcome.operation.name,
        instances = outcome.instances.len(),
        "bulk create resolved"
    );
    print_terminal_operation(&outcome.operation, output_format)?;
    if !outcome.instances.is_empty() {
        print_output(&outcome.instances, output_format)?;
    }
    Ok(())
}

async fn bulk_create_spread(
    conn_mgr: &ConnectionManager,
    target: &ResolvedTarget,
    region: &str,
    params: &BulkCreateParams,
    async_ops: &AsyncOperationArgs,
    output_format: OutputFormat,
) -> CliResult<()> {
    if !async_ops.wait {
        return Err(BulkVmError::InvalidInput {
            message: "--spread requires --wait: each zone's outcome drives the next request"
                .to_string(),
        });
    }
    let total = params.count.ok_or(BulkVmError::InvalidInput {
        message: "--count is required with --spread".to_string(),
    })?;

    let naming = params.naming()?;
    if matches!(naming, Naming::Names(_)) {
        // Per-zone counts vary, so only pattern naming divides cleanly.
        return Err(BulkVmError::InvalidInput {
            message: "--spread requires --name-pattern".to_string(),
        });
    }

    let client = conn_mgr.create_client(target)?;
    let settings = async_ops.poll_settings();
    let cancel = cancel_on_ctrl_c();
    let project = target.project.clone();

    let report = create_spread_across_zones(
        &client,
        &project,
        region,
        total,
        |zone, remaining| {
            let scope = Scope::zonal(&project, zone);
            let mut request = params.build(&naming, &scope, &params.machine_type);
            request.count = remaining;
            // Spread takes what each zone can give.
            request.min_count = Some(0);
            request
        },
        &settings,
        &cancel,
    )
    .await?;

    match output_format {
        OutputFormat::Auto | OutputFormat::Table => {
            println!(
                "Created {} of {} requested instances across {} operation(s)",
                report.created,
                report.requested,
                report.operations.len()
            );
            for operation in &report.operations {
                print_terminal_operation(operation, output_format)?;
            }
            if !report.is_complete() {
                println!("Region could not satisfy the full request");
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let value = serde_json::json!({
                "requested": report.requested,
                "created": report.created,
                "complete": report.is_complete(),
                "operations": report.operations,
            });
            print_output(value, output_format)?;
        }
    }
    Ok(())
}
