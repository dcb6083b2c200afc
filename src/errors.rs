//! Error types for lease checking
//!
//! Uses `thiserror` so callers can match on which step of a case failed.
//! Every variant keeps the underlying OS error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::case::TestCase;
use crate::lease::LeaseType;
use crate::runner::CaseOutcome;

/// Errors raised while setting up or driving a lease case
#[derive(Error, Debug)]
pub enum LeaseError {
    /// Opening the target file failed
    #[error("open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    /// The kernel rejected the lease request
    #[error("setlease {lease:?}: {source}")]
    SetLease {
        lease: LeaseType,
        #[source]
        source: nix::Error,
    },

    /// F_GETLEASE failed or returned an unknown value
    #[error("getlease: {0}")]
    GetLease(#[source] nix::Error),

    /// fork(2) failed
    #[error("fork: {0}")]
    Fork(#[source] nix::Error),

    /// waitpid(2) failed
    #[error("waitpid: {0}")]
    Wait(#[source] nix::Error),

    /// Installing the SIGIO handler failed
    #[error("sigaction: {0}")]
    SignalInstall(#[source] io::Error),
}

impl LeaseError {
    /// The raw errno behind this error, if any
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Open { source, .. } | Self::SetLease { source, .. } => Some(*source as i32),
            Self::GetLease(e) | Self::Fork(e) | Self::Wait(e) => Some(*e as i32),
            Self::SignalInstall(e) => e.raw_os_error(),
        }
    }
}

/// Result type alias for lease operations
pub type LeaseResult<T> = Result<T, LeaseError>;

/// Why a matrix case failed
#[derive(Error, Debug)]
pub enum FailureCause {
    /// Setup or process handling failed before a verdict was reached
    #[error(transparent)]
    Os(#[from] LeaseError),

    #[error("{0}")]
    Verdict(CaseOutcome),
}

impl FailureCause {
    /// errno of the OS failure; `None` for a verdict
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Os(e) => e.errno(),
            Self::Verdict(_) => None,
        }
    }
}

/// First failing case of a run, displayed as the one-line diagnostic
#[derive(Error, Debug)]
#[error("Test failure: {case}")]
pub struct CaseFailure {
    pub case: TestCase,
    #[source]
    pub cause: FailureCause,
}
