use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};

/// A non-blocking, line-oriented read end of a pipe. Partial trailing lines
/// are buffered across calls; parsers never see a line split across two
/// calls to [`LineChannel::drain_lines`].
pub struct LineChannel {
    fd: OwnedFd,
    buf: Vec<u8>,
}

impl LineChannel {
    /// Take ownership of a pipe read end, switching it to non-blocking mode.
    pub fn new(fd: OwnedFd) -> nix::Result<Self> {
        let current = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL)?;
        let flags = OFlag::from_bits_truncate(current) | OFlag::O_NONBLOCK;
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags))?;
        Ok(Self {
            fd,
            buf: Vec::new(),
        })
    }

    /// Read everything currently available without blocking, returning the
    /// complete (newline-terminated) lines among it. Whitespace is trimmed
    /// and empty lines are dropped; a trailing partial line stays buffered.
    pub fn drain_lines(&mut self) -> io::Result<Vec<String>> {
        let mut chunk = [0u8; 4096];
        loop {
            match nix::unistd::read(self.fd.as_fd(), &mut chunk) {
                Ok(0) => break,
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(Errno::EAGAIN) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from(e)),
            }
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1])
                .trim()
                .to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }
}
