use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::PathBuf;

use log::{info, warn};
use sfp::SfpMessage;
use thiserror::Error;

use crate::handlers;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

/// A bound SFSS endpoint: a UDP socket plus the directory tree it serves.
pub struct Server {
    socket: UdpSocket,
    root: PathBuf,
}

impl Server {
    pub fn bind(addr: impl ToSocketAddrs, root: PathBuf) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(addr)?;
        info!(
            "SFSS listening on {} serving {}",
            socket.local_addr()?,
            root.display()
        );
        Ok(Self { socket, root })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive, handle, and reply to one request. Malformed datagrams
    /// (wrong size) are logged and dropped rather than crashing the server.
    pub fn serve_one(&self) -> Result<(), ServerError> {
        let mut buf = vec![0u8; std::mem::size_of::<SfpMessage>()];
        let (n, from) = self.socket.recv_from(&mut buf)?;
        if n != buf.len() {
            warn!("dropped malformed datagram of {n} bytes from {from}");
            return Ok(());
        }
        let Some(req) = SfpMessage::from_bytes(&buf) else {
            warn!("dropped unparsable datagram from {from}");
            return Ok(());
        };
        let reply = handlers::handle(&req, &self.root);
        self.socket.send_to(reply.to_bytes(), from)?;
        Ok(())
    }

    /// Serve forever.
    pub fn run(&self) -> Result<(), ServerError> {
        loop {
            self.serve_one()?;
        }
    }
}
