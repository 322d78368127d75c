//! Shared utilities for commands that wait on operations
//!
//! Wraps the library poller with a progress spinner and Ctrl-C
//! cancellation, and decides how a just-submitted operation is shown
//! when the caller does not wait.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use bulkvm_core::compute::types::Operation;
use bulkvm_core::poller::{PollSettings, ProgressCallback, ProgressEvent};

use crate::error::Result as CliResult;
use crate::output::{print_output, OutputFormat};

/// Common CLI arguments for operations that can be waited on
#[derive(Args, Debug, Clone)]
pub struct AsyncOperationArgs {
    /// Wait for the operation to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds
    #[arg(long, default_value = "300", requires = "wait")]
    pub wait_timeout: u64,

    /// Polling interval in seconds
    #[arg(long, default_value = "2", requires = "wait")]
    pub wait_interval: u64,
}

impl AsyncOperationArgs {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::default()
            .with_timeout(std::time::Duration::from_secs(self.wait_timeout))
            .with_interval(std::time::Duration::from_secs(self.wait_interval))
    }
}

/// A cancellation token that fires on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

/// A spinner plus the progress callback that drives it.
pub fn spinner_progress(message: &str) -> (ProgressBar, ProgressCallback) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());

    let pb_clone = pb.clone();
    let callback: ProgressCallback = Box::new(move |event: ProgressEvent| match event {
        ProgressEvent::Started { name } => {
            pb_clone.set_message(format!("Operation {name} started"));
        }
        ProgressEvent::Polling { name, status, .. } => {
            pb_clone.set_message(format!("Operation {name}: {status}"));
        }
        ProgressEvent::Completed { name, .. } => {
            pb_clone.finish_with_message(format!("Operation {name}: \u{2713} done"));
        }
        ProgressEvent::Failed { name, detail } => {
            pb_clone.finish_with_message(format!("Operation {name}: \u{2717} {detail}"));
        }
    });

    (pb, callback)
}

/// Print a just-submitted operation the caller chose not to wait on.
pub fn print_submitted_operation(
    operation: &Operation,
    output_format: OutputFormat,
) -> CliResult<()> {
    match output_format {
        OutputFormat::Auto | OutputFormat::Table => {
            println!("Operation submitted: {}", operation.name);
            println!(
                "To wait for completion, run: bulkvm operations wait {}",
                operation.name
            );
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            print_output(operation, output_format)?;
        }
    }
    Ok(())
}

/// Print a terminal operation, surfacing its error entries for humans.
pub fn print_terminal_operation(
    operation: &Operation,
    output_format: OutputFormat,
) -> CliResult<()> {
    match output_format {
        OutputFormat::Auto | OutputFormat::Table => {
            println!("Operation {}: {}", operation.name, operation.status);
            if let Some(link) = &operation.target_link {
                println!("Target: {link}");
            }
            for entry in operation.error_entries() {
                println!("  error [{}]: {}", entry.code, entry.message);
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            print_output(operation, output_format)?;
        }
    }
    Ok(())
}
