use crate::value::ValueError;
use colored::Colorize;
use std::{fmt, sync::Arc};

/// Which kind of failure occurred while resolving a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required environment variable is not set
    MissingValue,
    /// The environment variable is set but not allowed or not parsable
    InvalidValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue => write!(f, "missing value"),
            Self::InvalidValue => write!(f, "invalid value"),
        }
    }
}

/// Errors that can occur while resolving a field.
///
/// Every error carries the formatted default value the field fell back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing
    MissingValue { key: String, default: String },
    /// An environment variable has an invalid value
    InvalidValue {
        key: String,
        value: String,
        reason: ValueError,
        default: String,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingValue { .. } => ErrorKind::MissingValue,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
        }
    }

    /// Name of the field that failed
    pub fn key(&self) -> &str {
        match self {
            Self::MissingValue { key, .. } | Self::InvalidValue { key, .. } => key,
        }
    }

    /// The formatted default value that was used instead
    pub fn default_value(&self) -> &str {
        match self {
            Self::MissingValue { default, .. } | Self::InvalidValue { default, .. } => default,
        }
    }

    /// Single line, uncolored description of the error
    pub fn summary(&self) -> String {
        match self {
            Self::MissingValue { key, default } => format!(
                "required field {key} is not set - using default value '{default}'"
            ),
            Self::InvalidValue {
                key,
                value,
                reason,
                default,
            } => format!(
                "field {key} has invalid value '{value}' ({reason}) - using default value '{default}'"
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingValue { key, default } => {
                writeln!(
                    f,
                    "{}: Is missing from environment and is required",
                    key.magenta().bold()
                )?;
                writeln!(f, "\tUsing default: {}", format!("'{}'", default).cyan())
            }
            ConfigError::InvalidValue {
                key,
                value,
                reason,
                default,
            } => {
                writeln!(
                    f,
                    "{}: Invalid value {}",
                    key.magenta().bold(),
                    format!("'{}'", value).red(),
                )?;
                writeln!(f, "\tReason: {}", reason)?;
                writeln!(f, "\tUsing default: {}", format!("'{}'", default).cyan())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingValue { .. } => None,
            Self::InvalidValue { reason, .. } => Some(reason),
        }
    }
}

/// Observer invoked for every failed resolution
pub type ErrorHook = Arc<dyn Fn(&ConfigError) + Send + Sync>;

/// The default hook: logs the error as a warning
pub fn log_error(error: &ConfigError) {
    tracing::warn!(
        field = error.key(),
        kind = %error.kind(),
        "{}",
        error.summary()
    );
}

/// Helper to format multiple configuration errors into a panic message
pub fn format_config_errors(errors: &[ConfigError]) -> String {
    let error_summary = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Configuration failed with {} error(s):\n{}",
        errors.len().to_string().yellow().bold(),
        error_summary
    )
}
