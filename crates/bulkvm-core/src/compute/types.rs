//! Wire types for the compute provisioning API
//!
//! Everything here is a transient view into provider-managed state: values
//! are fetched fresh on each call and never mutated locally. Request bodies
//! are immutable, explicitly constructed values - there are no shared
//! mutable templates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Base URL used for fully-qualified resource links (machine types, images,
/// networks) when the caller does not supply one.
pub const RESOURCE_URL_BASE: &str = "https://www.googleapis.com/compute/v1";

/// Status of an asynchronous operation as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
}

impl OperationStatus {
    /// Only `DONE` is terminal; everything else means "keep polling".
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Done)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::Running => "RUNNING",
            OperationStatus::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Enumerated failure reason reported against an operation.
///
/// Unknown codes are preserved verbatim in `Other` so that no diagnostic
/// information is lost between the provider and the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    ResourceAlreadyExists,
    ResourceExhausted,
    QuotaExceeded,
    Other(String),
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "RESOURCE_ALREADY_EXISTS" => ErrorCode::ResourceAlreadyExists,
            "RESOURCE_EXHAUSTED" => ErrorCode::ResourceExhausted,
            "QUOTA_EXCEEDED" => ErrorCode::QuotaExceeded,
            _ => ErrorCode::Other(value),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(value: ErrorCode) -> Self {
        match value {
            ErrorCode::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS".to_string(),
            ErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED".to_string(),
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED".to_string(),
            ErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::ResourceAlreadyExists => f.write_str("RESOURCE_ALREADY_EXISTS"),
            ErrorCode::ResourceExhausted => f.write_str("RESOURCE_EXHAUSTED"),
            ErrorCode::QuotaExceeded => f.write_str("QUOTA_EXCEEDED"),
            ErrorCode::Other(code) => f.write_str(code),
        }
    }
}

/// One failure reported against an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Error payload of a terminal operation. The entry order is meaningful
/// and preserved exactly as the provider reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

/// Per-location progress recorded in the metadata of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Service-specific metadata attached to a bulk-insert operation.
///
/// `locations` is a `BTreeMap` so that iteration order is deterministic;
/// "pick the first zone" is well-defined only against sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    #[serde(default)]
    pub locations: BTreeMap<String, LocationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_index: Option<u64>,
}

/// An in-flight or completed asynchronous task on the remote service.
///
/// Created by an insert-type call, mutated only by the provider, polled
/// read-only by this client. Immutable once `status` is `DONE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OperationMetadata>,
}

impl Operation {
    /// The full ordered error list, empty when the operation has no error
    /// payload. First-entry-only inspection is caller policy; this method
    /// never reorders or truncates.
    #[must_use]
    pub fn error_entries(&self) -> &[ErrorEntry] {
        self.error.as_ref().map_or(&[], |e| e.errors.as_slice())
    }

    /// True when the operation resolved to a failed outcome.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.error_entries().is_empty()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }
}

/// The scope an operation or resource lives in: a single zone, or a
/// region whose zones the provider may choose between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Zonal { project: String, zone: String },
    Regional { project: String, region: String },
}

impl Scope {
    pub fn zonal(project: impl Into<String>, zone: impl Into<String>) -> Self {
        Scope::Zonal {
            project: project.into(),
            zone: zone.into(),
        }
    }

    pub fn regional(project: impl Into<String>, region: impl Into<String>) -> Self {
        Scope::Regional {
            project: project.into(),
            region: region.into(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        match self {
            Scope::Zonal { project, .. } | Scope::Regional { project, .. } => project,
        }
    }

    /// Zone or region name, whichever this scope carries.
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Scope::Zonal { zone, .. } => zone,
            Scope::Regional { region, .. } => region,
        }
    }

    /// A zonal scope in the same project.
    #[must_use]
    pub fn with_zone(&self, zone: impl Into<String>) -> Scope {
        Scope::zonal(self.project(), zone)
    }

    pub(crate) fn instances_path(&self) -> String {
        match self {
            Scope::Zonal { project, zone } => {
                format!("/projects/{project}/zones/{zone}/instances")
            }
            Scope::Regional { project, region } => {
                format!("/projects/{project}/regions/{region}/instances")
            }
        }
    }

    pub(crate) fn operations_path(&self) -> String {
        match self {
            Scope::Zonal { project, zone } => {
                format!("/projects/{project}/zones/{zone}/operations")
            }
            Scope::Regional { project, region } => {
                format!("/projects/{project}/regions/{region}/operations")
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Zonal { project, zone } => write!(f, "{project}/zones/{zone}"),
            Scope::Regional { project, region } => write!(f, "{project}/regions/{region}"),
        }
    }
}

/// Boot-disk initialization parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub source_image: String,
}

/// A disk attached to each created instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub auto_delete: bool,
    pub boot: bool,
    pub initialize_params: InitializeParams,
    pub mode: String,
    #[serde(rename = "type")]
    pub disk_type: String,
}

/// External NAT configuration for a network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub config_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub network: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    pub automatic_restart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub email: String,
    pub scopes: Vec<String>,
}

/// Per-instance template inside a bulk-insert request.
///
/// `name` is required by the wire format but ignored by the provider when
/// names come from `predefined_names` or `name_pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTemplate {
    pub name: String,
    pub machine_type: String,
    pub can_ip_forward: bool,
    pub deletion_protection: bool,
    pub disks: Vec<AttachedDisk>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub scheduling: Scheduling,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_accounts: Vec<ServiceAccount>,
}

impl InstanceTemplate {
    /// A standard template: one auto-deleted boot disk from `source_image`,
    /// one NAT-enabled interface on `network`, automatic restart, and the
    /// default service account with cloud-platform scope.
    pub fn new(
        machine_type: impl Into<String>,
        source_image: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        InstanceTemplate {
            name: "unused".to_string(),
            machine_type: machine_type.into(),
            can_ip_forward: false,
            deletion_protection: false,
            disks: vec![AttachedDisk {
                auto_delete: true,
                boot: true,
                initialize_params: InitializeParams {
                    source_image: source_image.into(),
                },
                mode: "READ_WRITE".to_string(),
                disk_type: "PERSISTENT".to_string(),
            }],
            network_interfaces: vec![NetworkInterface {
                network: network.into(),
                access_configs: vec![AccessConfig {
                    name: "external-nat".to_string(),
                    config_type: "ONE_TO_ONE_NAT".to_string(),
                }],
            }],
            scheduling: Scheduling {
                automatic_restart: true,
            },
            service_accounts: vec![ServiceAccount {
                email: "default".to_string(),
                scopes: vec!["https://www.googleapis.com/auth/cloud-platform".to_string()],
            }],
        }
    }

    /// Same template with a different machine type, for retrying a request
    /// against another family or location.
    #[must_use]
    pub fn with_machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = machine_type.into();
        self
    }
}

/// Fully-qualified machine type link for a zonal request.
#[must_use]
pub fn zonal_machine_type(project: &str, zone: &str, machine_type: &str) -> String {
    format!("{RESOURCE_URL_BASE}/projects/{project}/zones/{zone}/machineTypes/{machine_type}")
}

/// Fully-qualified machine type link for a regional request.
#[must_use]
pub fn regional_machine_type(project: &str, region: &str, machine_type: &str) -> String {
    format!("{RESOURCE_URL_BASE}/projects/{project}/regions/{region}/machineTypes/{machine_type}")
}

/// Fully-qualified network link.
#[must_use]
pub fn network_link(project: &str, network: &str) -> String {
    format!("{RESOURCE_URL_BASE}/projects/{project}/global/networks/{network}")
}

/// A bulk creation request: how many instances, how they are named, and
/// the template they share. Constructed once and never mutated; retries
/// with different parameters build a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkInsertRequest {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predefined_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    pub instance: InstanceTemplate,
}

impl BulkInsertRequest {
    /// Request one instance per name in `names`.
    pub fn with_names(names: Vec<String>, instance: InstanceTemplate) -> Self {
        BulkInsertRequest {
            count: names.len() as u64,
            min_count: None,
            predefined_names: Some(names),
            name_pattern: None,
            instance,
        }
    }

    /// Request `count` instances named by expanding `pattern`
    /// (e.g. `instance-####`).
    pub fn with_pattern(pattern: impl Into<String>, count: u64, instance: InstanceTemplate) -> Self {
        BulkInsertRequest {
            count,
            min_count: None,
            predefined_names: None,
            name_pattern: Some(pattern.into()),
            instance,
        }
    }

    /// Accept partial fulfilment: the provider creates at least `min_count`
    /// instances or fails the whole request. Zero means "as many as you can".
    #[must_use]
    pub fn with_min_count(mut self, min_count: u64) -> Self {
        self.min_count = Some(min_count);
        self
    }

    /// Structural validation performed before the request leaves the client.
    pub fn validate(&self) -> Result<(), String> {
        if self.count == 0 {
            return Err("count must be at least 1".to_string());
        }
        match (&self.predefined_names, &self.name_pattern) {
            (Some(_), Some(_)) => {
                Err("predefined names and a name pattern are mutually exclusive".to_string())
            }
            (None, None) => Err("either predefined names or a name pattern is required".to_string()),
            (Some(names), None) => {
                if names.len() as u64 != self.count {
                    Err(format!(
                        "count is {} but {} names were supplied",
                        self.count,
                        names.len()
                    ))
                } else {
                    Ok(())
                }
            }
            (None, Some(pattern)) => {
                if pattern.contains('#') {
                    Ok(())
                } else {
                    Err(format!("name pattern '{pattern}' has no '#' placeholder"))
                }
            }
        }
    }
}

/// A created (or pre-existing) virtual machine as reported by list calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

/// A zone descriptor returned by the zone list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// One page of a paginated list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// The zone name at the end of a location key such as `zones/us-west1-a`
/// or a full zone URL.
#[must_use]
pub fn zone_name_from_location(location: &str) -> &str {
    location.rsplit('/').next().unwrap_or(location)
}
