use crate::bom::domain::TrustLevel;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish a failed trust evaluation
/// from a broken invocation or an infrastructure problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - every dependency passed the trust policy
    Success = 0,
    /// The trust policy rejected one or more dependencies
    PolicyFailure = 1,
    /// Invalid command-line arguments or parameters
    InvalidArguments = 2,
    /// Application error (tool failure, network error, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Picks the exit code matching the root error of a failed run
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<BomError>() {
            Some(BomError::TrustPolicyViolation(_)) => ExitCode::PolicyFailure,
            Some(BomError::InvalidParameter { .. }) | Some(BomError::InvalidArtifactPath { .. }) => {
                ExitCode::InvalidArguments
            }
            _ => ExitCode::ApplicationError,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::PolicyFailure => write!(f, "Policy Failure (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// One dependency that made the trust evaluation fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOffender {
    pub name: String,
    pub version: String,
    pub level: TrustLevel,
}

/// Outcome of a rejected trust evaluation
///
/// Lists every offending dependency, not only the first one found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFailure {
    pub required: TrustLevel,
    pub offenders: Vec<PolicyOffender>,
    pub unsupported_count: usize,
    pub unsupported_allowed: Option<usize>,
}

impl PolicyFailure {
    pub fn threshold_exceeded(&self) -> bool {
        self.unsupported_allowed
            .is_some_and(|allowed| self.unsupported_count > allowed)
    }
}

impl fmt::Display for PolicyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dependenc{} failed the {} trust level requirement",
            self.offenders.len(),
            if self.offenders.len() == 1 { "y" } else { "ies" },
            self.required
        )?;
        if let (true, Some(allowed)) = (self.threshold_exceeded(), self.unsupported_allowed) {
            write!(
                f,
                " ({} unsupported, at most {} allowed)",
                self.unsupported_count, allowed
            )?;
        }
        for offender in &self.offenders {
            write!(
                f,
                "\n  - {}@{}: {}",
                offender.name, offender.version, offender.level
            )?;
        }
        Ok(())
    }
}

/// Application-specific errors for BOM discovery and trust evaluation.
///
/// Uses thiserror to derive Display and Error traits automatically.
/// Anything that callers need to tell apart (policy outcome, ledger
/// compromise, bad parameters) gets its own variant so it can be downcast
/// from an `anyhow::Error`.
#[derive(Debug, Error)]
pub enum BomError {
    #[error("Unsupported artifact format/language: {path}\n\n💡 Hint: Supported inputs are Go binaries and modules, Pipfile.lock, poetry.lock, requirements.txt, .NET projects, Maven projects and npm projects")]
    UnsupportedArtifact { path: PathBuf },

    #[error("Failed to parse {ecosystem} manifest: {path}\nDetails: {details}")]
    ManifestParse {
        ecosystem: String,
        path: PathBuf,
        details: String,
    },

    #[error("Malformed hash for dependency {dependency}: {details}")]
    MalformedHash { dependency: String, details: String },

    #[error("Unsupported hash algorithm tag '{tag}' in '{entry}'")]
    UnsupportedHashType { tag: String, entry: String },

    #[error("External tool '{tool}' failed\nDetails: {details}\n\n💡 Hint: Please verify that the tool is installed and on your PATH")]
    ToolFailure { tool: String, details: String },

    #[error("Failed to resolve hash for dependency {dependency}\nDetails: {details}")]
    HashLookup { dependency: String, details: String },

    #[error("Invalid {name}: {details}")]
    InvalidParameter { name: String, details: String },

    #[error("Ledger verification failed while authenticating {dependency}: the ledger may be compromised")]
    LedgerCompromised { dependency: String },

    #[error("Trust policy violation: {0}")]
    TrustPolicyViolation(PolicyFailure),

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Invalid artifact path: {path}\nReason: {reason}\n\n💡 Hint: Please specify an existing file or directory")]
    InvalidArtifactPath { path: PathBuf, reason: String },
}
