//! # bulkvm-core
//!
//! Client library for a cloud provider's bulk virtual-machine creation
//! API. The provider does the real work - scheduling, capacity
//! allocation, consistency; this crate owns the client-side obligations
//! that are easy to get wrong:
//!
//! - **Operation polling** ([`poller`]): resolve an operation handle to
//!   its terminal outcome with bounded backoff, a hard deadline, and an
//!   external cancellation signal. Transport failures and
//!   operation-level failures are kept on separate channels.
//! - **Pagination** ([`compute`]): list calls follow `nextPageToken`
//!   until the result set is exhausted.
//! - **Recovery policy** ([`policy`]): a pure function from the full
//!   ordered error-entry list of a failed operation to an action.
//! - **Workflows** ([`workflows`]): create-and-wait compositions -
//!   zonal, regional with explicit zone selection, spread across a
//!   region's zones, machine-family fallback, per-instance fan-out.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulkvm_core::compute::types::{BulkInsertRequest, InstanceTemplate, Scope};
//! use bulkvm_core::compute::ComputeClient;
//! use bulkvm_core::poller::PollSettings;
//! use bulkvm_core::workflows::create_instances_and_wait;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ComputeClient::builder().token(token).build()?;
//! let scope = Scope::zonal("my-project", "us-west1-a");
//! let template = InstanceTemplate::new(machine_type, image, network);
//! let request = BulkInsertRequest::with_names(names, template);
//!
//! let outcome = create_instances_and_wait(
//!     &client,
//!     &scope,
//!     &request,
//!     &PollSettings::default(),
//!     &CancellationToken::new(),
//!     None,
//! )
//! .await?;
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod policy;
pub mod poller;
pub mod workflows;

pub use compute::{ComputeClient, ComputeError};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use policy::{classify, RecoveryAction};
pub use poller::{poll_operation, PollSettings, ProgressCallback, ProgressEvent};
