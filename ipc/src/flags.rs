//! The volatile flags signal handlers set become a lock-free atomic bitset,
//! read and cleared at the top of the kernel's event loop. Handlers do no
//! work beyond an atomic store, per the async-signal-safety rule.

use std::os::raw::c_int;
use std::sync::atomic::{AtomicU8, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static FLAGS: AtomicU8 = AtomicU8::new(0);

/// Bits set by [`install_handlers`]'s signal handler, consumed by
/// [`take_flags`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFlags {
    /// Bytes available on the controller channel (`SIGUSR1`).
    ControllerPending = 1 << 0,
    /// Bytes available on the app channel (`SIGUSR2`).
    AppPending = 1 << 1,
    /// Operator asked to pause and print a snapshot (`SIGINT`).
    SnapshotRequested = 1 << 2,
    /// Operator asked to resume after a snapshot (`SIGCONT`).
    ResumeRequested = 1 << 3,
}

impl SignalFlags {
    pub fn is_set(self, bits: u8) -> bool {
        bits & (self as u8) != 0
    }
}

extern "C" fn on_signal(signum: c_int) {
    let bit = if signum == Signal::SIGUSR1 as c_int {
        SignalFlags::ControllerPending as u8
    } else if signum == Signal::SIGUSR2 as c_int {
        SignalFlags::AppPending as u8
    } else if signum == Signal::SIGINT as c_int {
        SignalFlags::SnapshotRequested as u8
    } else if signum == Signal::SIGCONT as c_int {
        SignalFlags::ResumeRequested as u8
    } else {
        return;
    };
    FLAGS.fetch_or(bit, Ordering::SeqCst);
}

/// Install the shared handler for all four signals the kernel loop reacts
/// to. Must be called once, before the event loop starts waiting.
pub fn install_handlers() -> nix::Result<()> {
    unsafe {
        signal::signal(Signal::SIGUSR1, SigHandler::Handler(on_signal))?;
        signal::signal(Signal::SIGUSR2, SigHandler::Handler(on_signal))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(on_signal))?;
        signal::signal(Signal::SIGCONT, SigHandler::Handler(on_signal))?;
    }
    Ok(())
}

/// Atomically read and clear every flag set since the last call.
pub fn take_flags() -> u8 {
    FLAGS.swap(0, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_set_checks_the_right_bit() {
        let bits = SignalFlags::ControllerPending as u8 | SignalFlags::ResumeRequested as u8;
        assert!(SignalFlags::ControllerPending.is_set(bits));
        assert!(SignalFlags::ResumeRequested.is_set(bits));
        assert!(!SignalFlags::AppPending.is_set(bits));
        assert!(!SignalFlags::SnapshotRequested.is_set(bits));
    }
}
