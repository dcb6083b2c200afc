//! The fixed lease-break matrix

use crate::lease::{AccessMode, LeaseType};
use std::fmt;

/// One (lease, conflicting open) combination and its expected outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    /// Mode the lease holder opens the file with
    pub open_flags: AccessMode,
    pub lease_type: LeaseType,
    /// Mode the second process opens the file with
    pub conflicting_open_flags: AccessMode,
    /// Whether the second open must break the lease
    pub expect_signal: bool,
}

impl TestCase {
    pub const fn new(
        open_flags: AccessMode,
        lease_type: LeaseType,
        conflicting_open_flags: AccessMode,
        expect_signal: bool,
    ) -> Self {
        Self {
            open_flags,
            lease_type,
            conflicting_open_flags,
            expect_signal,
        }
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "openflags={} leasetype={} conf_openflags={} expect_signal={}",
            self.open_flags,
            self.lease_type,
            self.conflicting_open_flags,
            u8::from(self.expect_signal)
        )
    }
}

/// Cases run in order by [`crate::runner::LeaseTestRunner::run_all`]
pub const MATRIX: [TestCase; 4] = [
    TestCase::new(AccessMode::ReadOnly, LeaseType::Read, AccessMode::ReadOnly, false),
    TestCase::new(AccessMode::ReadOnly, LeaseType::Read, AccessMode::WriteOnly, true),
    TestCase::new(AccessMode::WriteOnly, LeaseType::Write, AccessMode::ReadOnly, true),
    TestCase::new(AccessMode::WriteOnly, LeaseType::Write, AccessMode::WriteOnly, true),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_follows_conflict_rule() {
        for case in &MATRIX {
            assert_eq!(
                case.expect_signal,
                case.lease_type.conflicts_with(case.conflicting_open_flags),
                "{case}"
            );
        }
    }

    #[test]
    fn test_lease_holder_mode_matches_lease() {
        // 読み取りリースはO_RDONLY、書き込みリースはO_WRONLYで開く
        for case in &MATRIX {
            let expected = match case.lease_type {
                LeaseType::Read => AccessMode::ReadOnly,
                _ => AccessMode::WriteOnly,
            };
            assert_eq!(case.open_flags, expected);
        }
    }

    #[test]
    fn test_display_uses_raw_values() {
        let line = MATRIX[1].to_string();
        assert_eq!(
            line,
            format!(
                "openflags={} leasetype={} conf_openflags={} expect_signal=1",
                libc::O_RDONLY,
                libc::F_RDLCK,
                libc::O_WRONLY
            )
        );
    }
}
