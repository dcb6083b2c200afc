//! SIGIO bookkeeping for lease breaks
//!
//! The kernel delivers SIGIO to the lease holder when another process opens
//! the leased file in a conflicting mode. The handler does a single atomic
//! store and nothing else; the runner polls the flag.

use crate::errors::{LeaseError, LeaseResult};
use signal_hook::consts::signal::SIGIO;
use signal_hook::SigId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Registered SIGIO handler plus the flag it raises
pub struct LeaseBreakSignal {
    observed: Arc<AtomicBool>,
    id: SigId,
}

impl LeaseBreakSignal {
    /// Install the SIGIO handler.
    ///
    /// Only SIGIO is subscribed; the handler is removed again on drop.
    pub fn install() -> LeaseResult<Self> {
        let observed = Arc::new(AtomicBool::new(false));
        let id = signal_hook::flag::register(SIGIO, Arc::clone(&observed))
            .map_err(LeaseError::SignalInstall)?;
        debug!("SIGIO handler installed");
        Ok(Self { observed, id })
    }

    /// Whether SIGIO arrived since the last [`reset`](Self::reset)
    pub fn observed(&self) -> bool {
        self.observed.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.observed.store(false, Ordering::SeqCst);
    }
}

impl Drop for LeaseBreakSignal {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.id);
    }
}
