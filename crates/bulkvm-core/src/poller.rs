//! Operation polling with backoff, cancellation, and progress callbacks
//!
//! Insert-type calls return an operation handle which must be polled
//! until it reaches `DONE`. The status query itself may long-poll
//! server-side and still reply with a non-terminal status, so the loop
//! never assumes a single query resolves the operation.
//!
//! Two failure channels are kept strictly apart:
//!
//! - transport/request failures abort the loop (permanent) or are retried
//!   with capped exponential backoff (transient);
//! - a `DONE` operation carrying an error payload is a successful
//!   resolution to a failed outcome and is returned as `Ok` with the
//!   full ordered error list intact.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::compute::types::{Operation, OperationStatus, Scope};
use crate::compute::{ComputeClient, OperationHandler};
use crate::error::{CoreError, Result};

/// Progress events emitted while resolving an operation.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Polling has begun for the named operation.
    Started { name: String },
    /// One status query completed with the given (possibly non-terminal)
    /// status.
    Polling {
        name: String,
        status: OperationStatus,
        elapsed: Duration,
    },
    /// The operation reached `DONE` with an empty error payload.
    Completed {
        name: String,
        target_link: Option<String>,
    },
    /// The poll loop is returning an unsuccessful outcome: an operation
    /// that resolved with errors, a transport failure, a timeout, or a
    /// cancellation.
    Failed { name: String, detail: String },
}

/// Callback type for progress updates.
///
/// The CLI uses this to drive spinners; library callers typically pass
/// `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Tuning for [`poll_operation`].
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Overall deadline; guarantees termination for stuck operations.
    pub timeout: Duration,
    /// Pause between successive status queries.
    pub interval: Duration,
    /// Consecutive transient transport failures tolerated before the
    /// loop gives up.
    pub max_transport_retries: u32,
    /// First backoff pause after a transient transport failure.
    pub initial_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(2),
            max_transport_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(32),
        }
    }
}

impl PollSettings {
    /// Settings with a different overall deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Settings with a different query interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Resolve `operation_name` in `scope` to its terminal value.
///
/// Never returns a non-terminal operation. A terminal operation with a
/// non-empty error payload is returned as `Ok`; inspect
/// [`Operation::error_entries`] and apply policy at the call site.
///
/// # Errors
///
/// - [`CoreError::Cancelled`] when `cancel` fires before `DONE`;
/// - [`CoreError::OperationTimeout`] when the deadline elapses;
/// - [`CoreError::Compute`] for permanent request failures, or transient
///   ones that exhausted the retry budget.
pub async fn poll_operation(
    client: &ComputeClient,
    scope: &Scope,
    operation_name: &str,
    settings: &PollSettings,
    cancel: &CancellationToken,
    on_progress: Option<&ProgressCallback>,
) -> Result<Operation> {
    let start = Instant::now();
    let handler = OperationHandler::new(client.clone());

    emit(
        on_progress,
        ProgressEvent::Started {
            name: operation_name.to_string(),
        },
    );

    let mut transport_failures = 0u32;
    let mut backoff = settings.initial_backoff;

    loop {
        let elapsed = start.elapsed();
        if elapsed > settings.timeout {
            emit(
                on_progress,
                ProgressEvent::Failed {
                    name: operation_name.to_string(),
                    detail: format!("timed out after {:?}", settings.timeout),
                },
            );
            return Err(CoreError::OperationTimeout(settings.timeout));
        }

        let query = tokio::select! {
            () = cancel.cancelled() => {
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        name: operation_name.to_string(),
                        detail: "cancelled".to_string(),
                    },
                );
                return Err(CoreError::Cancelled);
            }
            result = handler.wait(scope, operation_name) => result,
        };

        match query {
            Ok(operation) => {
                transport_failures = 0;
                backoff = settings.initial_backoff;

                emit(
                    on_progress,
                    ProgressEvent::Polling {
                        name: operation_name.to_string(),
                        status: operation.status,
                        elapsed: start.elapsed(),
                    },
                );

                if operation.status.is_terminal() {
                    if let Some(first) = operation.error_entries().first() {
                        // Resolved to a failed outcome. Still Ok: the
                        // caller owns the policy over the error entries.
                        emit(
                            on_progress,
                            ProgressEvent::Failed {
                                name: operation_name.to_string(),
                                detail: format!("{}: {}", first.code, first.message),
                            },
                        );
                    } else {
                        emit(
                            on_progress,
                            ProgressEvent::Completed {
                                name: operation_name.to_string(),
                                target_link: operation.target_link.clone(),
                            },
                        );
                    }
                    return Ok(operation);
                }

                debug!(
                    operation = operation_name,
                    status = %operation.status,
                    "operation not terminal yet"
                );
                sleep_or_cancel(settings.interval, cancel).await?;
            }
            Err(e) if e.is_retryable() => {
                transport_failures += 1;
                if transport_failures > settings.max_transport_retries {
                    emit(
                        on_progress,
                        ProgressEvent::Failed {
                            name: operation_name.to_string(),
                            detail: format!("transport retries exhausted: {e}"),
                        },
                    );
                    return Err(e.into());
                }
                warn!(
                    operation = operation_name,
                    attempt = transport_failures,
                    delay = ?backoff,
                    error = %e,
                    "transient failure querying operation status, backing off"
                );
                sleep_or_cancel(backoff, cancel).await?;
                backoff = (backoff * 2).min(settings.max_backoff);
            }
            Err(e) => {
                // Permanent request failure: surface immediately with the
                // classification intact so the caller can fix the request.
                emit(
                    on_progress,
                    ProgressEvent::Failed {
                        name: operation_name.to_string(),
                        detail: e.to_string(),
                    },
                );
                return Err(e.into());
            }
        }
    }
}

async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(CoreError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
