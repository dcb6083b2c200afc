//! Drives each lease case through a parent/child process pair
//!
//! Per case the parent opens the target and takes the lease, forks a child
//! that performs the conflicting open, then races "SIGIO arrived" against
//! "child exited" with a short polling loop. The lease is released and the
//! descriptor closed before the child is reaped and the verdict computed.

use crate::case::{TestCase, MATRIX};
use crate::errors::{CaseFailure, FailureCause, LeaseError, LeaseResult};
use crate::lease::{open_conflicting, open_target, release_lease, set_lease};
use crate::signal::LeaseBreakSignal;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a case that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Child opened the file and the signal expectation held
    Passed,
    /// Signal expectation held but the child's open failed
    ConflictingOpenFailed { code: i32 },
    SignalMismatch { expected: bool, observed: bool },
    /// Child did not exit normally
    AbnormalExit { status: WaitStatus },
}

impl CaseOutcome {
    /// Decide a case from the reaped child status and the SIGIO flag
    pub fn judge(case: &TestCase, status: WaitStatus, observed: bool) -> Self {
        match status {
            WaitStatus::Exited(_, _) if case.expect_signal != observed => Self::SignalMismatch {
                expected: case.expect_signal,
                observed,
            },
            WaitStatus::Exited(_, 0) => Self::Passed,
            WaitStatus::Exited(_, code) => Self::ConflictingOpenFailed { code },
            status => Self::AbnormalExit { status },
        }
    }

    /// Process-style result: 0 on pass, 1 otherwise.
    ///
    /// A failed conflicting open and a signal mismatch both map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::ConflictingOpenFailed { code } => *code,
            Self::SignalMismatch { .. } | Self::AbnormalExit { .. } => 1,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.exit_code() == 0
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::ConflictingOpenFailed { code } => {
                write!(f, "conflicting open failed (child exit {code})")
            }
            Self::SignalMismatch { expected, observed } => {
                write!(f, "expected signal={expected}, observed signal={observed}")
            }
            Self::AbnormalExit { status } => write!(f, "child terminated abnormally: {status:?}"),
        }
    }
}

/// Runs lease cases against one target path
pub struct LeaseTestRunner {
    path: PathBuf,
    poll_interval: Duration,
    signal: LeaseBreakSignal,
}

impl LeaseTestRunner {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);
    /// Upper bound on the poll interval so a lease break is noticed promptly
    pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(9);

    /// Install the SIGIO handler and prepare to run cases against `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> LeaseResult<Self> {
        let signal = LeaseBreakSignal::install()?;
        Ok(Self {
            path: path.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            signal,
        })
    }

    /// Set how long the parent sleeps between checks (capped at 9ms)
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.min(Self::MAX_POLL_INTERVAL);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run one case, returning its outcome or the OS error that stopped it
    pub fn run_case(&self, case: &TestCase) -> LeaseResult<CaseOutcome> {
        self.signal.reset();

        let fd = open_target(&self.path, case.open_flags)?;
        set_lease(&fd, case.lease_type)?;

        // SAFETY: the child only calls open(2)/close(2) before exiting.
        let child = match unsafe { fork() }.map_err(LeaseError::Fork)? {
            ForkResult::Parent { child } => child,
            ForkResult::Child => {
                drop(fd);
                let code = match open_conflicting(&self.path, case.conflicting_open_flags) {
                    Ok(()) => 0,
                    Err(_) => 1,
                };
                // SAFETY: _exit(2) is async-signal-safe and runs no atexit handlers.
                unsafe { libc::_exit(code) }
            }
        };
        debug!(%child, "forked conflicting opener");

        let polled = self.wait_for_break_or_exit(child);

        release_lease(&fd);
        drop(fd);

        let status = match polled? {
            Some(status) => status,
            None => wait_blocking(child)?,
        };
        let observed = self.signal.observed();
        debug!(?status, observed, "child reaped");

        Ok(CaseOutcome::judge(case, status, observed))
    }

    /// Run every case in [`MATRIX`] in order, stopping at the first failure
    pub fn run_all(&self) -> Result<(), CaseFailure> {
        for (index, case) in MATRIX.iter().enumerate() {
            info!(index, %case, "running case");
            let cause = match self.run_case(case) {
                Ok(outcome) if outcome.is_pass() => {
                    info!(index, "case passed");
                    continue;
                }
                Ok(outcome) => FailureCause::Verdict(outcome),
                Err(e) => FailureCause::Os(e),
            };
            return Err(CaseFailure { case: *case, cause });
        }
        Ok(())
    }

    /// Poll until SIGIO is seen or the child exits.
    ///
    /// Returns the child's status if it was reaped here.
    fn wait_for_break_or_exit(&self, child: Pid) -> LeaseResult<Option<WaitStatus>> {
        while !self.signal.observed() {
            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => thread::sleep(self.poll_interval),
                Ok(status) => return Ok(Some(status)),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(LeaseError::Wait(e)),
            }
        }
        Ok(None)
    }
}

fn wait_blocking(child: Pid) -> LeaseResult<WaitStatus> {
    loop {
        match waitpid(child, None) {
            Err(Errno::EINTR) => continue,
            result => return result.map_err(LeaseError::Wait),
        }
    }
}
