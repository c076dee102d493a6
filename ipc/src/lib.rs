//! Host-process plumbing shared by every role the simulator's binaries can
//! play: a lock-free signal-flag bitset, non-blocking line-oriented pipe
//! channels, a POSIX-backed shared memory reply slot, and child-process
//! control helpers. Carries no knowledge of SFP or the kernel's scheduling
//! rules — those live in `kernelsim`.

mod channel;
mod flags;
mod process;
mod shmem;

pub use channel::LineChannel;
pub use flags::{SignalFlags, install_handlers, take_flags};
pub use process::{ChildHandle, send_signal, spawn_role, wait_for_wakeup};
pub use shmem::ReplySlot;
