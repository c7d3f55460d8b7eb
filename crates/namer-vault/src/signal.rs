//! Interruption handling around a transaction.
//!
//! Handlers are installed once per process. Outside a transaction a
//! SIGINT, SIGTERM or SIGHUP terminates the process as usual. While a
//! [`ShutdownGuard`] is held the signal is only recorded; the transaction
//! notices it at its next step boundary, rolls back on its own thread and
//! returns [`namer_core::NamerError::Interrupted`].
//!
//! ```rust,no_run
//! use namer_vault::signal::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! shutdown.install().expect("signal handlers");
//!
//! let guard = shutdown.arm();
//! // ... run the transaction with `&shutdown` as its interrupt source ...
//! drop(guard);
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use signal_hook::consts::SIGHUP;
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::transaction::Interrupt;

/// Exit status used when a signal arrives outside a transaction.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Shared record of a pending interruption.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    /// Signal number that arrived while armed (0 if none).
    signal_num: Arc<AtomicUsize>,
    /// True while no transaction is running; signals then terminate.
    idle: Arc<AtomicBool>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            signal_num: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Register handlers for SIGINT, SIGTERM and (on unix) SIGHUP.
    ///
    /// # Errors
    ///
    /// Returns the error from `signal-hook` if registration fails.
    pub fn install(&self) -> io::Result<()> {
        let mut signals = vec![SIGINT, SIGTERM];
        #[cfg(unix)]
        signals.push(SIGHUP);

        for signal in signals {
            signal_hook::flag::register_conditional_shutdown(
                signal,
                INTERRUPTED_EXIT_CODE,
                Arc::clone(&self.idle),
            )?;
            signal_hook::flag::register_usize(
                signal,
                Arc::clone(&self.signal_num),
                usize::try_from(signal).unwrap_or(usize::MAX),
            )?;
        }
        Ok(())
    }

    /// Enter a transaction: signals are recorded instead of terminating.
    #[must_use = "dropping the guard immediately disarms it"]
    pub fn arm(&self) -> ShutdownGuard {
        self.signal_num.store(0, Ordering::Release);
        self.idle.store(false, Ordering::Release);
        ShutdownGuard {
            shutdown: self.clone(),
        }
    }

    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.signal_num.load(Ordering::Acquire) != 0
    }

    /// Record a signal by hand, as the handler would.
    pub fn trigger(&self, signal: i32) {
        self.signal_num
            .store(usize::try_from(signal).unwrap_or(usize::MAX), Ordering::Release);
    }

    #[must_use]
    pub fn signal_name(&self) -> &'static str {
        let num = self.signal_num.load(Ordering::Acquire);
        match i32::try_from(num) {
            Ok(0) => "none",
            Ok(SIGINT) => "SIGINT",
            Ok(SIGTERM) => "SIGTERM",
            #[cfg(unix)]
            Ok(SIGHUP) => "SIGHUP",
            _ => "unknown signal",
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt for ShutdownSignal {
    fn pending(&self) -> Option<String> {
        self.is_signaled().then(|| self.signal_name().to_string())
    }
}

/// Keeps signals deferred until dropped.
#[derive(Debug)]
pub struct ShutdownGuard {
    shutdown: ShutdownSignal,
}

impl ShutdownGuard {
    /// Whether a signal arrived while this guard was held.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.shutdown.is_signaled()
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.shutdown.idle.store(true, Ordering::Release);
    }
}
