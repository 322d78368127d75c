//! Typed client for the compute provisioning API
//!
//! The remote service is an opaque collaborator: every call here is a
//! thin, typed pass-through. The one obligation this module takes on
//! beyond transport is pagination - list calls follow `nextPageToken`
//! until the result set is exhausted.

pub mod client;
pub mod error;
pub mod instances;
pub mod operations;
pub mod types;
pub mod zones;

pub use client::{ComputeClient, ComputeClientBuilder, DEFAULT_API_URL};
pub use error::{ComputeError, ComputeResult};
pub use instances::{name_filter, InstanceHandler};
pub use operations::{client_operation_filter, OperationHandler};
pub use zones::ZoneHandler;
