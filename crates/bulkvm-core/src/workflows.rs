//! Bulk creation workflows - multi-step operations
//!
//! These compose the compute client with the operation poller and the
//! recovery policy. Each workflow is a straight-line composition; no
//! state is shared between invocations, and concurrent use is a
//! call-site choice.

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::compute::operations::client_operation_filter;
use crate::compute::types::{
    zone_name_from_location, BulkInsertRequest, Instance, Operation, Scope,
};
use crate::compute::{name_filter, ComputeClient, InstanceHandler, OperationHandler, ZoneHandler};
use crate::error::{CoreError, Result};
use crate::policy::{classify, RecoveryAction};
use crate::poller::{poll_operation, PollSettings, ProgressCallback};

/// Result of a create-and-wait workflow: the terminal operation plus the
/// instances the creation produced (empty when the operation resolved
/// with errors).
#[derive(Debug, Clone)]
pub struct BulkCreateOutcome {
    pub operation: Operation,
    pub instances: Vec<Instance>,
}

/// How to choose a zone out of a bulk operation's per-location metadata.
///
/// The metadata map is sorted (`BTreeMap`), so `FirstSorted` is
/// deterministic; callers with a preference supply it explicitly.
#[derive(Debug, Clone, Default)]
pub enum ZoneSelection {
    #[default]
    FirstSorted,
    Preferred(String),
}

impl ZoneSelection {
    fn pick(&self, operation: &Operation) -> Option<String> {
        let locations = &operation.metadata.as_ref()?.locations;
        match self {
            ZoneSelection::FirstSorted => locations
                .keys()
                .next()
                .map(|key| zone_name_from_location(key).to_string()),
            ZoneSelection::Preferred(zone) => locations
                .keys()
                .find(|key| zone_name_from_location(key) == zone)
                .map(|key| zone_name_from_location(key).to_string()),
        }
    }
}

/// Create instances in a single zone and wait for the terminal outcome.
///
/// Returns the terminal operation - including any error payload - plus
/// the created instances fetched through a name-filtered list. The list
/// is pagination-complete.
pub async fn create_instances_and_wait(
    client: &ComputeClient,
    scope: &Scope,
    request: &BulkInsertRequest,
    settings: &PollSettings,
    cancel: &CancellationToken,
    on_progress: Option<&ProgressCallback>,
) -> Result<BulkCreateOutcome> {
    let instances = InstanceHandler::new(client.clone());

    let operation = instances.bulk_insert(scope, request).await?;
    let operation =
        poll_operation(client, scope, &operation.name, settings, cancel, on_progress).await?;

    if operation.has_errors() {
        // Failed outcome: report it as data, nothing to list.
        return Ok(BulkCreateOutcome {
            operation,
            instances: Vec::new(),
        });
    }

    let filter = request.predefined_names.as_deref().map(name_filter);
    let created = instances.list(scope, filter.as_deref()).await?;
    Ok(BulkCreateOutcome {
        operation,
        instances: created,
    })
}

/// Create instances across a region and wait for the terminal outcome.
///
/// The operation is polled in its own regional scope. `selection`
/// chooses which of the zones recorded in the operation metadata to list
/// created instances from; when the metadata names no zone the regional
/// scope is used as-is.
pub async fn create_instances_in_region_and_wait(
    client: &ComputeClient,
    project: &str,
    region: &str,
    request: &BulkInsertRequest,
    selection: &ZoneSelection,
    settings: &PollSettings,
    cancel: &CancellationToken,
    on_progress: Option<&ProgressCallback>,
) -> Result<BulkCreateOutcome> {
    let scope = Scope::regional(project, region);
    let instances = InstanceHandler::new(client.clone());

    let operation = instances.bulk_insert(&scope, request).await?;
    let operation =
        poll_operation(client, &scope, &operation.name, settings, cancel, on_progress).await?;

    if operation.has_errors() {
        return Ok(BulkCreateOutcome {
            operation,
            instances: Vec::new(),
        });
    }

    let list_scope = selection
        .pick(&operation)
        .map_or_else(|| scope.clone(), |zone| scope.with_zone(zone));
    let filter = request.predefined_names.as_deref().map(name_filter);
    let created = instances.list(&list_scope, filter.as_deref()).await?;
    Ok(BulkCreateOutcome {
        operation,
        instances: created,
    })
}

/// Resolve every per-instance operation spawned by a bulk operation.
///
/// Lists the children via the `clientOperationId` filter, then polls
/// each one as an independent concurrent task. Results keep the listing
/// order; each terminal operation's `target_link` points at the instance
/// that is now ready for work.
pub async fn wait_on_instance_operations(
    client: &ComputeClient,
    scope: &Scope,
    bulk_operation_name: &str,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<Vec<Operation>> {
    let handler = OperationHandler::new(client.clone());
    let filter = client_operation_filter(bulk_operation_name);
    let children = handler.list(scope, Some(&filter)).await?;
    info!(
        parent = bulk_operation_name,
        children = children.len(),
        "waiting on per-instance operations"
    );

    let polls = children
        .iter()
        .map(|child| poll_operation(client, scope, &child.name, settings, cancel, None));
    join_all(polls).await.into_iter().collect()
}

/// Names produced by expanding `pattern` for `count` instances starting
/// at `starting_index`.
///
/// The contiguous `#` run in the pattern sets the zero-padded width:
/// `instance-####` with starting index 7 yields `instance-0007`,
/// `instance-0008`, ...
pub fn expand_name_pattern(pattern: &str, starting_index: u64, count: u64) -> Result<Vec<String>> {
    let Some(start) = pattern.find('#') else {
        return Err(CoreError::Validation(format!(
            "name pattern '{pattern}' has no '#' placeholder"
        )));
    };
    let end = pattern[start..]
        .find(|c| c != '#')
        .map_or(pattern.len(), |offset| start + offset);
    if pattern[end..].contains('#') {
        return Err(CoreError::Validation(format!(
            "name pattern '{pattern}' has more than one '#' run"
        )));
    }

    let prefix = &pattern[..start];
    let suffix = &pattern[end..];
    let width = end - start;

    Ok((0..count)
        .map(|offset| {
            let index = starting_index + offset;
            format!("{prefix}{index:0width$}{suffix}")
        })
        .collect())
}

/// Names created by a terminal bulk operation that used a name pattern,
/// inferred from its metadata.
pub fn created_names(operation: &Operation, pattern: &str) -> Result<Vec<String>> {
    let metadata = operation.metadata.as_ref().ok_or_else(|| {
        CoreError::Validation(format!("operation {} carries no metadata", operation.name))
    })?;
    let starting_index = metadata.starting_index.ok_or_else(|| {
        CoreError::Validation(format!(
            "operation {} metadata has no starting index",
            operation.name
        ))
    })?;
    let count = metadata.instances_created.unwrap_or(0);
    expand_name_pattern(pattern, starting_index, count)
}

/// Report of a spread-across-zones run.
#[derive(Debug, Clone)]
pub struct SpreadReport {
    pub requested: u64,
    pub created: u64,
    /// Terminal operations in zone order, including any that resolved
    /// with errors - nothing is discarded.
    pub operations: Vec<Operation>,
}

impl SpreadReport {
    /// True when every requested instance was created.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.created >= self.requested
    }
}

/// Create up to `total` instances spread across the zones of a region.
///
/// Zones are tried in sorted order. Each per-zone request is built fresh
/// by `make_request` (zone name, remaining count) and should set
/// `min_count` to zero so a zone contributes what it can. Exhausted
/// zones are skipped; an unrecoverable operation outcome stops the scan,
/// with the offending operation kept in the report for inspection.
pub async fn create_spread_across_zones(
    client: &ComputeClient,
    project: &str,
    region: &str,
    total: u64,
    make_request: impl Fn(&str, u64) -> BulkInsertRequest,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<SpreadReport> {
    let zones = ZoneHandler::new(client.clone())
        .list_in_region(project, region)
        .await?;
    let instances = InstanceHandler::new(client.clone());

    let mut remaining = total;
    let mut operations = Vec::new();

    for zone in &zones {
        if remaining == 0 {
            break;
        }
        let scope = Scope::zonal(project, &zone.name);
        let request = make_request(&zone.name, remaining);

        let operation = match instances.bulk_insert(&scope, &request).await {
            Ok(operation) => operation,
            Err(e) if e.is_resource_exhausted() => {
                warn!(zone = %zone.name, "zone exhausted at request time, moving on");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let operation =
            poll_operation(client, &scope, &operation.name, settings, cancel, None).await?;
        let created = operation
            .metadata
            .as_ref()
            .and_then(|m| m.instances_created)
            .unwrap_or(0);
        remaining = remaining.saturating_sub(created);

        let action = classify(operation.error_entries());
        operations.push(operation);
        match action {
            RecoveryAction::Proceed | RecoveryAction::AlreadySatisfied => {}
            RecoveryAction::TryAlternative => {
                warn!(zone = %zone.name, "zone exhausted, trying the next zone");
            }
            RecoveryAction::Fail => {
                warn!(zone = %zone.name, "unrecoverable operation outcome, stopping the scan");
                break;
            }
        }
    }

    Ok(SpreadReport {
        requested: total,
        created: total - remaining,
        operations,
    })
}

/// Create instances with the first machine family that has capacity.
///
/// Families are tried in caller order; `make_request` builds the request
/// for one family. Request-level stockout and operation-level
/// exhaustion both advance to the next family. The first operation that
/// resolves cleanly (or as already satisfied) is returned; an
/// unrecoverable outcome is returned as data for the caller to inspect.
///
/// # Errors
///
/// [`CoreError::ExhaustedAlternatives`] when every family is out of
/// capacity.
pub async fn create_with_machine_family_fallback(
    client: &ComputeClient,
    scope: &Scope,
    families: &[String],
    make_request: impl Fn(&str) -> BulkInsertRequest,
    settings: &PollSettings,
    cancel: &CancellationToken,
    on_progress: Option<&ProgressCallback>,
) -> Result<Operation> {
    let instances = InstanceHandler::new(client.clone());

    for family in families {
        let request = make_request(family);
        let operation = match instances.bulk_insert(scope, &request).await {
            Ok(operation) => operation,
            Err(e) if e.is_resource_exhausted() => {
                warn!(family, "no capacity for family at request time");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let operation =
            poll_operation(client, scope, &operation.name, settings, cancel, on_progress).await?;

        match classify(operation.error_entries()) {
            RecoveryAction::Proceed | RecoveryAction::AlreadySatisfied => {
                info!(family, operation = %operation.name, "family accepted");
                return Ok(operation);
            }
            RecoveryAction::TryAlternative => {
                warn!(family, "family exhausted, trying the next one");
            }
            RecoveryAction::Fail => {
                warn!(family, "unrecoverable outcome, returning it for inspection");
                return Ok(operation);
            }
        }
    }

    Err(CoreError::ExhaustedAlternatives(families.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::types::{LocationStatus, OperationMetadata, OperationStatus};
    use std::collections::BTreeMap;

    #[test]
    fn expand_name_pattern_pads_to_run_width() {
        let names = expand_name_pattern("instance-####", 7, 3).unwrap();
        assert_eq!(names, vec!["instance-0007", "instance-0008", "instance-0009"]);
    }

    #[test]
    fn expand_name_pattern_keeps_suffix() {
        let names = expand_name_pattern("vm-##-prod", 99, 2).unwrap();
        assert_eq!(names, vec!["vm-99-prod", "vm-100-prod"]);
    }

    #[test]
    fn expand_name_pattern_rejects_bad_patterns() {
        assert!(expand_name_pattern("instance", 0, 2).is_err());
        assert!(expand_name_pattern("a-##-b-##", 0, 2).is_err());
    }

    #[test]
    fn expand_name_pattern_zero_count_is_empty() {
        assert!(expand_name_pattern("vm-##", 5, 0).unwrap().is_empty());
    }

    fn operation_with_locations(keys: &[&str]) -> Operation {
        let locations: BTreeMap<String, LocationStatus> = keys
            .iter()
            .map(|k| ((*k).to_string(), LocationStatus::default()))
            .collect();
        Operation {
            id: None,
            name: "op".to_string(),
            status: OperationStatus::Done,
            zone: None,
            region: Some("us-west1".to_string()),
            operation_type: None,
            target_link: None,
            client_operation_id: None,
            error: None,
            metadata: Some(OperationMetadata {
                locations,
                instances_created: None,
                starting_index: None,
            }),
        }
    }

    #[test]
    fn zone_selection_first_sorted_is_deterministic() {
        // Insertion order scrambled on purpose; BTreeMap sorts the keys.
        let op = operation_with_locations(&["zones/us-west1-c", "zones/us-west1-a"]);
        assert_eq!(
            ZoneSelection::FirstSorted.pick(&op),
            Some("us-west1-a".to_string())
        );
    }

    #[test]
    fn zone_selection_preferred_matches_by_zone_name() {
        let op = operation_with_locations(&["zones/us-west1-a", "zones/us-west1-b"]);
        assert_eq!(
            ZoneSelection::Preferred("us-west1-b".to_string()).pick(&op),
            Some("us-west1-b".to_string())
        );
        assert_eq!(
            ZoneSelection::Preferred("us-west1-z".to_string()).pick(&op),
            None
        );
    }

    #[test]
    fn created_names_requires_metadata() {
        let mut op = operation_with_locations(&[]);
        op.metadata = None;
        assert!(created_names(&op, "vm-##").is_err());

        let mut op = operation_with_locations(&[]);
        if let Some(m) = op.metadata.as_mut() {
            m.starting_index = Some(12);
            m.instances_created = Some(2);
        }
        assert_eq!(created_names(&op, "vm-##").unwrap(), vec!["vm-12", "vm-13"]);
    }
}
