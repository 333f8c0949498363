//! Error taxonomy for packaging operations.

use std::time::Duration;

use thiserror::Error;

use crate::variant::{Operation, Variant};

#[derive(Debug, Error)]
pub enum PackagingError {
    /// The variant has no equivalent for the requested operation.
    #[error("{operation} is not supported by {variant}")]
    Unsupported {
        variant: Variant,
        operation: Operation,
    },

    /// A template was rendered with the wrong number of arguments.
    #[error("{operation} on {variant} expects {expected} argument(s), got {got}")]
    TemplateArity {
        variant: Variant,
        operation: Operation,
        expected: String,
        got: usize,
    },

    /// The named package, snap or repository does not exist.
    #[error("not found: {name}")]
    NotFound {
        name: String,
        command: String,
        output: String,
    },

    /// The command failed and retrying would not help.
    #[error("packaging command failed: {command} ({reason})")]
    Fatal {
        command: String,
        code: Option<i32>,
        reason: String,
        output: String,
    },

    /// Every attempt hit a transient failure.
    #[error("packaging command failed after {attempts} attempt(s): {command} (exit code {code})")]
    AttemptsExceeded {
        command: String,
        attempts: u32,
        code: i32,
        output: String,
    },

    /// Command output did not have the expected structure.
    #[error("unexpected output from {command}: {reason}")]
    MalformedOutput {
        command: String,
        reason: String,
        output: String,
    },

    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cancelled while running {command}")]
    Cancelled { command: String },

    #[error("gave up on {command} after {elapsed:?}")]
    DeadlineExceeded { command: String, elapsed: Duration },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PackagingError {
    /// Captured output of the command that caused this error, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            PackagingError::NotFound { output, .. }
            | PackagingError::Fatal { output, .. }
            | PackagingError::AttemptsExceeded { output, .. }
            | PackagingError::MalformedOutput { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Rendered command line that caused this error, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            PackagingError::NotFound { command, .. }
            | PackagingError::Fatal { command, .. }
            | PackagingError::AttemptsExceeded { command, .. }
            | PackagingError::MalformedOutput { command, .. }
            | PackagingError::Spawn { command, .. }
            | PackagingError::Cancelled { command }
            | PackagingError::DeadlineExceeded { command, .. } => Some(command),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PackagingError::NotFound { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, PackagingError::Unsupported { .. })
    }
}

pub type Result<T, E = PackagingError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = PackagingError::Unsupported {
            variant: Variant::Snap,
            operation: Operation::AddRepository,
        };
        assert_eq!(err.to_string(), "add-repository is not supported by snap");
        assert!(err.is_unsupported());
        assert!(err.output().is_none());
    }

    #[test]
    fn test_output_and_command_are_kept() {
        let err = PackagingError::AttemptsExceeded {
            command: "apt-get update".to_string(),
            attempts: 3,
            code: 100,
            output: "Could not get lock".to_string(),
        };
        assert_eq!(err.output(), Some("Could not get lock"));
        assert_eq!(err.command(), Some("apt-get update"));
        assert!(err.to_string().contains("3 attempt(s)"));
    }

    #[test]
    fn test_not_found_display() {
        let err = PackagingError::NotFound {
            name: "foo".to_string(),
            command: "snap install foo".to_string(),
            output: "error: snap \"foo\" not found".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: foo");
    }
}
