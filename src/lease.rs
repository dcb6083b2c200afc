//! Thin wrappers around open(2) and the F_SETLEASE / F_GETLEASE fcntl commands

use crate::errors::{LeaseError, LeaseResult};
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use std::fmt;
use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use std::path::Path;
use tracing::debug;

/// Permission bits used when the target file has to be created
pub const CREATE_MODE: u32 = 0o644;

/// Lease kinds accepted by F_SETLEASE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseType {
    /// Shared lease, broken by write-mode opens
    Read,
    /// Exclusive lease, broken by any open
    Write,
    /// No lease held
    Unlock,
}

impl LeaseType {
    /// Raw fcntl argument for this lease type
    pub fn raw(self) -> libc::c_int {
        match self {
            Self::Read => libc::F_RDLCK as libc::c_int,
            Self::Write => libc::F_WRLCK as libc::c_int,
            Self::Unlock => libc::F_UNLCK as libc::c_int,
        }
    }

    fn from_raw(raw: libc::c_int) -> Option<Self> {
        [Self::Read, Self::Write, Self::Unlock]
            .into_iter()
            .find(|l| l.raw() == raw)
    }

    /// Whether an open with `mode` by another process breaks this lease
    pub fn conflicts_with(self, mode: AccessMode) -> bool {
        match self {
            Self::Read => mode == AccessMode::WriteOnly,
            Self::Write => true,
            Self::Unlock => false,
        }
    }
}

impl fmt::Display for LeaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Access mode of an open(2) call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
}

impl AccessMode {
    pub fn oflag(self) -> OFlag {
        match self {
            Self::ReadOnly => OFlag::O_RDONLY,
            Self::WriteOnly => OFlag::O_WRONLY,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.oflag().bits())
    }
}

fn open_owned(path: &Path, flags: OFlag, mode: Mode) -> LeaseResult<OwnedFd> {
    let raw = open(path, flags, mode).map_err(|source| LeaseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // SAFETY: open(2) just returned this descriptor and nothing else owns it.
    Ok(unsafe { OwnedFd::from_raw_fd(raw) })
}

/// Open (creating with mode 0644 if absent) the file a lease will be taken on
pub fn open_target(path: &Path, mode: AccessMode) -> LeaseResult<OwnedFd> {
    open_owned(
        path,
        mode.oflag() | OFlag::O_CREAT,
        Mode::from_bits_truncate(CREATE_MODE as libc::mode_t),
    )
}

/// Open `path` with `mode` and close it straight away.
///
/// This is the open a second process performs to provoke a lease break.
/// It never creates the file.
pub fn open_conflicting(path: &Path, mode: AccessMode) -> LeaseResult<()> {
    let fd = open_owned(path, mode.oflag(), Mode::empty())?;
    drop(fd);
    Ok(())
}

/// Attach (or with [`LeaseType::Unlock`] remove) a lease on `fd`
pub fn set_lease<Fd: AsFd>(fd: &Fd, lease: LeaseType) -> LeaseResult<()> {
    let raw = fd.as_fd().as_raw_fd();
    // SAFETY: F_SETLEASE takes an int argument and only touches kernel state.
    let ret = unsafe { libc::fcntl(raw, libc::F_SETLEASE, lease.raw()) };
    Errno::result(ret).map_err(|source| LeaseError::SetLease { lease, source })?;
    debug!(fd = raw, ?lease, "lease set");
    Ok(())
}

/// Drop whatever lease is held on `fd`, ignoring failure
pub fn release_lease<Fd: AsFd>(fd: &Fd) {
    if let Err(e) = set_lease(fd, LeaseType::Unlock) {
        debug!(error = %e, "lease release failed, ignoring");
    }
}

/// Lease currently held on `fd`, as reported by F_GETLEASE
pub fn current_lease<Fd: AsFd>(fd: &Fd) -> LeaseResult<LeaseType> {
    // SAFETY: F_GETLEASE takes no argument.
    let ret = unsafe { libc::fcntl(fd.as_fd().as_raw_fd(), libc::F_GETLEASE) };
    let raw = Errno::result(ret).map_err(LeaseError::GetLease)?;
    LeaseType::from_raw(raw).ok_or(LeaseError::GetLease(Errno::EINVAL))
}
