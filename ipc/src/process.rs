use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::path::Path;
use std::process::{Child, Command, Stdio};

use nix::poll::{PollFd, PollFlags, ppoll};
use nix::sys::signal::{self, SigSet, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// A child process spawned by [`spawn_role`], tracked by its OS pid. Its
/// stdout is always piped, since every role writes its lines (`IRQn`,
/// `TICK`/`DONE`/syscalls) there for the kernel to read via a
/// [`crate::LineChannel`].
pub struct ChildHandle {
    pub pid: i32,
    child: Child,
}

impl ChildHandle {
    pub fn stop(&self) -> nix::Result<()> {
        send_signal(self.pid, Signal::SIGSTOP)
    }

    pub fn cont(&self) -> nix::Result<()> {
        send_signal(self.pid, Signal::SIGCONT)
    }

    pub fn terminate(&self) -> nix::Result<()> {
        send_signal(self.pid, Signal::SIGTERM)
    }

    /// Non-blocking reap: `Ok(true)` if the child has exited.
    pub fn try_reap(&mut self) -> nix::Result<bool> {
        match wait::waitpid(Pid::from_raw(self.pid), Some(WaitPidFlag::WNOHANG))? {
            WaitStatus::StillAlive => Ok(false),
            _ => Ok(true),
        }
    }

    pub fn wait(&mut self) -> io::Result<std::process::ExitStatus> {
        self.child.wait()
    }

    /// Take ownership of this child's piped stdout, for wrapping in a
    /// [`crate::LineChannel`]. `None` if already taken.
    pub fn take_stdout(&mut self) -> Option<OwnedFd> {
        self.child.stdout.take().map(OwnedFd::from)
    }
}

/// Send a signal to a raw OS pid. Used for the kernel's own bookkeeping
/// (stop/continue the running app, stop/resume the controller) as well as
/// an app's "signal kernel" half of the wake-up protocol.
pub fn send_signal(pid: i32, sig: Signal) -> nix::Result<()> {
    signal::kill(Pid::from_raw(pid), sig)
}

/// Block until either `fd` has data to read or a signal arrives, whichever
/// comes first — the simulator's single suspension point, matching the
/// original kernel's `pselect(udp_sockfd + 1, &read_fds, ..., &empty_mask)`:
/// an empty signal mask means every signal the process would otherwise
/// handle is left unblocked for the duration of the wait, so `SIGUSR1`,
/// `SIGUSR2`, `SIGINT`, and `SIGCONT` all interrupt it immediately rather
/// than waiting for a polling interval to elapse.
pub fn wait_for_wakeup(fd: BorrowedFd) -> nix::Result<()> {
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    match ppoll(&mut fds, None, Some(SigSet::empty())) {
        Ok(_) => Ok(()),
        Err(nix::errno::Errno::EINTR) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Spawn a copy of the current executable with the given role arguments
/// (e.g. `["inter"]` or `["app", "3"]`), matching `exec(argv[0], ...)` in
/// the original: every role is the same binary, dispatched by argv. Stdout
/// is piped so the caller can wrap it in a [`crate::LineChannel`].
pub fn spawn_role(exe: &Path, args: &[&str]) -> io::Result<ChildHandle> {
    let child = Command::new(exe)
        .args(args)
        .stdout(Stdio::piped())
        .spawn()?;
    let pid = child.id() as i32;
    Ok(ChildHandle { pid, child })
}
