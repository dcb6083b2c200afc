//! Kernel file-lease break checker
//!
//! Takes a lease on a file with `F_SETLEASE`, has a second process open the
//! same file, and checks that `SIGIO` reaches the lease holder exactly when
//! that open conflicts with the lease.

pub mod case;
pub mod errors;
pub mod lease;
pub mod runner;
pub mod signal;

// Re-export commonly used types
pub use case::{TestCase, MATRIX};
pub use errors::{CaseFailure, FailureCause, LeaseError, LeaseResult};
pub use lease::{AccessMode, LeaseType};
pub use runner::{CaseOutcome, LeaseTestRunner};
pub use signal::LeaseBreakSignal;
