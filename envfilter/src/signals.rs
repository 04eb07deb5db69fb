// envfilter/src/signals.rs
//! Cancellation signals for wrapped commands.
//!
//! Listeners are installed before any file is externalized. From then on a
//! SIGINT or SIGTERM is queued for the run loop instead of ending the process,
//! so teardown always gets to run.

use std::io;

/// Exit code for a run cancelled with SIGINT (Ctrl-C).
pub const EXIT_INTERRUPTED: u8 = 130;

/// Exit code for a run cancelled with SIGTERM.
pub const EXIT_TERMINATED: u8 = 143;

/// The signal that cancelled a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Interrupt,
    Terminate,
}

impl Interrupt {
    pub fn exit_code(self) -> u8 {
        match self {
            Interrupt::Interrupt => EXIT_INTERRUPTED,
            Interrupt::Terminate => EXIT_TERMINATED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Interrupt::Interrupt => "SIGINT",
            Interrupt::Terminate => "SIGTERM",
        }
    }
}

/// Installed SIGINT/SIGTERM listeners. Must be created inside the tokio runtime.
#[derive(Debug)]
pub struct Interrupts {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl Interrupts {
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(windows)]
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Waits for the next cancellation signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Interrupt {
        tokio::select! {
            _ = self.interrupt.recv() => Interrupt::Interrupt,
            _ = self.terminate.recv() => Interrupt::Terminate,
        }
    }

    #[cfg(windows)]
    pub async fn recv(&mut self) -> Interrupt {
        self.ctrl_c.recv().await;
        Interrupt::Interrupt
    }
}
