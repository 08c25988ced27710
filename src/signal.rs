//! Ctrl+C handling.
//!
//! The process installs one `ctrlc` hook. It only flips an [`InterruptFlag`];
//! the front end polls that flag while waiting for scan events and forwards
//! it to [`ScanHandle::request_cancel`](crate::duplicates::ScanHandle::request_cancel),
//! so the worker winds down cooperatively and the map collected so far is
//! still reported.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static GLOBAL_FLAG: OnceLock<InterruptFlag> = OnceLock::new();

/// Shared "Ctrl+C was pressed" flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// A fresh, unset flag with no signal hook attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an interrupt arrived.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Mark as interrupted.
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the next scan starts uninterrupted.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Install the Ctrl+C hook, or return the flag it already drives.
///
/// Repeated calls (for example from several tests in one process) share a
/// single flag, cleared on every call. If another component already owns the
/// process signal handler the returned flag is never set by a signal, but can
/// still be set by hand.
pub fn install_handler() -> InterruptFlag {
    let flag = GLOBAL_FLAG.get_or_init(|| {
        let flag = InterruptFlag::new();
        let hook = flag.clone();
        let installed = ctrlc::set_handler(move || {
            hook.set();
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\nInterrupted. Finishing current file...");
            let _ = stderr.flush();
        });
        if let Err(e) = installed {
            log::warn!("Ctrl+C will not cancel scans: {}", e);
        }
        flag
    });
    flag.clear();
    flag.clone()
}
