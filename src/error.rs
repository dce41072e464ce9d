//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the SampleDupe application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed, but some entries were skipped)
/// - 4: Configuration error (bad root or option, nothing scanned)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Scan completed but some directories or files were skipped.
    PartialSuccess = 3,
    /// Configuration error: rejected before any worker started.
    ConfigError = 4,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SD000",
            Self::GeneralError => "SD001",
            Self::NoDuplicates => "SD002",
            Self::PartialSuccess => "SD003",
            Self::ConfigError => "SD004",
            Self::Interrupted => "SD130",
        }
    }

    /// Pick the exit code for an error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        use crate::config::ConfigError;
        use crate::scanner::ScanError;

        for cause in err.chain() {
            if let Some(scan) = cause.downcast_ref::<ScanError>() {
                return match scan {
                    ScanError::Interrupted => Self::Interrupted,
                    ScanError::Config(_) => Self::ConfigError,
                    ScanError::ThreadPool(_) => Self::GeneralError,
                };
            }
            if cause.downcast_ref::<ConfigError>().is_some() {
                return Self::ConfigError;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::scanner::ScanError;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::NoDuplicates.as_i32(), 2);
        assert_eq!(ExitCode::ConfigError.as_i32(), 4);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::PartialSuccess.code_prefix(), "SD003");
    }

    #[test]
    fn test_for_error_finds_scan_error_under_context() {
        let err: anyhow::Error = Err::<(), _>(ScanError::Interrupted)
            .context("scan failed")
            .unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);

        let err = anyhow::Error::new(ScanError::Config(ConfigError::RootNotFound(
            PathBuf::from("/x"),
        )));
        assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);

        let err = anyhow::Error::new(ConfigError::NoRoots);
        assert_eq!(ExitCode::for_error(&err), ExitCode::ConfigError);

        let err = anyhow::anyhow!("boom");
        assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_json() {
        let err = anyhow::Error::new(ScanError::Interrupted);
        let structured = StructuredError::new(&err, ExitCode::Interrupted);
        let json = serde_json::to_string(&structured).unwrap();

        assert!(json.contains("\"code\":\"SD130\""));
        assert!(json.contains("\"interrupted\":true"));
    }
}
