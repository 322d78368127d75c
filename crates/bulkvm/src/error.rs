//! CLI error types and cargo-style diagnostics

use colored::Colorize;
use thiserror::Error;

use bulkvm_core::compute::ComputeError;
use bulkvm_core::error::CoreError;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: profile 'prod' not found
///
///   tip: list available profiles:
///       bulkvm profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {detail}");
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{description}");
            for cmd in commands {
                eprintln!("      {cmd}");
            }
        }
    }
}

/// Main error type for the bulkvm binary
#[derive(Error, Debug)]
pub enum BulkVmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'bulkvm profile set' to configure one.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}'")]
    MissingCredentials { name: String },

    #[error("No {field} given and the profile sets no default")]
    MissingScopeField { field: &'static str },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for bulkvm CLI operations
pub type Result<T> = std::result::Result<T, BulkVmError>;

impl BulkVmError {
    /// Helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            BulkVmError::ProfileNotFound { name } => vec![
                "List available profiles: bulkvm profile list".to_string(),
                format!("Create profile '{name}': bulkvm profile set {name} --project <project>"),
            ],
            BulkVmError::NoProfileConfigured => vec![
                "Create a profile: bulkvm profile set myprofile --project <project> --zone <zone> --token '${BULKVM_TOKEN}'".to_string(),
                "Or set BULKVM_PROJECT and BULKVM_TOKEN environment variables".to_string(),
            ],
            BulkVmError::MissingCredentials { name } => vec![
                format!("Update the profile token: bulkvm profile set {name} --project <project> --token '${{BULKVM_TOKEN}}'"),
                "Or export BULKVM_TOKEN in the environment".to_string(),
            ],
            BulkVmError::MissingScopeField { field } => vec![
                format!("Pass --{field} on the command line"),
                format!("Or set a default: bulkvm profile set <name> --project <project> --{field} <{field}>"),
            ],
            BulkVmError::AuthenticationFailed { .. } => vec![
                "Check the token: bulkvm profile show <profile>".to_string(),
                "Verify the token has compute permissions on the project".to_string(),
            ],
            BulkVmError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API endpoint: bulkvm profile show <profile>".to_string(),
            ],
            BulkVmError::ApiError { message } if message.contains("not found") => vec![
                "Verify the resource name is correct".to_string(),
                "List resources to find the right name: bulkvm operations list".to_string(),
            ],
            BulkVmError::Timeout { .. } => vec![
                "Raise the wait budget with --timeout / --wait-timeout".to_string(),
                "Check the operation later: bulkvm operations get <name>".to_string(),
            ],
            BulkVmError::InvalidInput { .. } => vec![
                "Check the command syntax: bulkvm <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }
        diag.print();
    }
}

impl From<ComputeError> for BulkVmError {
    fn from(err: ComputeError) -> Self {
        match err {
            ComputeError::AuthenticationFailed { message } => {
                BulkVmError::AuthenticationFailed { message }
            }
            ComputeError::Request(e) => BulkVmError::ConnectionError {
                message: e.to_string(),
            },
            ComputeError::Validation(message) => BulkVmError::InvalidInput { message },
            other => BulkVmError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for BulkVmError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OperationTimeout(duration) => BulkVmError::Timeout {
                message: format!("operation still not terminal after {}s", duration.as_secs()),
            },
            CoreError::Cancelled => BulkVmError::Cancelled,
            CoreError::Validation(message) => BulkVmError::InvalidInput { message },
            CoreError::ExhaustedAlternatives(tried) => BulkVmError::ApiError {
                message: format!("every alternative was out of capacity: {tried}"),
            },
            CoreError::Compute(compute) => BulkVmError::from(compute),
            CoreError::Config(config) => BulkVmError::Configuration(config.to_string()),
        }
    }
}

impl From<bulkvm_core::ConfigError> for BulkVmError {
    fn from(err: bulkvm_core::ConfigError) -> Self {
        match err {
            bulkvm_core::ConfigError::ProfileNotFound { name } => {
                BulkVmError::ProfileNotFound { name }
            }
            bulkvm_core::ConfigError::NoProfileConfigured => BulkVmError::NoProfileConfigured,
            other => BulkVmError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for BulkVmError {
    fn from(err: serde_json::Error) -> Self {
        BulkVmError::OutputError {
            message: format!("JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for BulkVmError {
    fn from(err: std::io::Error) -> Self {
        BulkVmError::OutputError {
            message: format!("IO error: {err}"),
        }
    }
}

impl From<anyhow::Error> for BulkVmError {
    fn from(err: anyhow::Error) -> Self {
        BulkVmError::Configuration(err.to_string())
    }
}
