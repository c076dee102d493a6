//! End-to-end tests that drive `Server` over a real UDP socket, the way the
//! kernel process actually talks to SFSS.

use std::net::UdpSocket;
use std::sync::Arc;

use sfp::{MsgType, SfpMessage, StatusError};
use sfss::Server;
use tempfile::tempdir;

fn start(root: std::path::PathBuf) -> Arc<Server> {
    Arc::new(Server::bind("127.0.0.1:0", root).unwrap())
}

fn serve_n(server: Arc<Server>, n: usize) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for _ in 0..n {
            server.serve_one().unwrap();
        }
    })
}

struct Client {
    socket: UdpSocket,
    server_addr: std::net::SocketAddr,
}

impl Client {
    fn connect(server: &Server) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        Self {
            socket,
            server_addr: server.local_addr().unwrap(),
        }
    }

    fn roundtrip(&self, req: &SfpMessage) -> SfpMessage {
        self.socket
            .send_to(req.to_bytes(), self.server_addr)
            .unwrap();
        let mut buf = vec![0u8; std::mem::size_of::<SfpMessage>()];
        let (n, _) = self.socket.recv_from(&mut buf).unwrap();
        assert_eq!(n, buf.len());
        SfpMessage::from_bytes(&buf).expect("valid reply record")
    }
}

fn req(owner: i32, kind: MsgType, path: &str) -> SfpMessage {
    let mut m = SfpMessage::zeroed();
    m.set_kind(kind);
    m.owner = owner;
    m.set_path(path);
    m
}

#[test]
fn write_then_read_over_the_wire() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("A1")).unwrap();
    let server = start(dir.path().to_path_buf());
    let client = Client::connect(&server);
    let bg = serve_n(server, 2);

    let mut wr = req(1, MsgType::WrReq, "/A1/f");
    wr.set_payload(b"PING");
    let wr_rep = client.roundtrip(&wr);
    assert_eq!(wr_rep.kind(), Some(MsgType::WrRep));
    assert_eq!(wr_rep.offset, 0);

    let rd = req(1, MsgType::RdReq, "/A1/f");
    let rd_rep = client.roundtrip(&rd);
    assert_eq!(rd_rep.kind(), Some(MsgType::RdRep));
    assert_eq!(&rd_rep.payload[..4], b"PING");

    bg.join().unwrap();
}

#[test]
fn permission_denied_over_the_wire() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("A1")).unwrap();
    std::fs::write(dir.path().join("A1/secret"), b"s").unwrap();
    let server = start(dir.path().to_path_buf());
    let client = Client::connect(&server);
    let bg = serve_n(server, 1);

    let rd = req(2, MsgType::RdReq, "/A1/secret");
    let rep = client.roundtrip(&rd);
    assert_eq!(rep.offset, StatusError::PERMISSION);

    bg.join().unwrap();
}

#[test]
fn unknown_message_type_gets_echoed_error() {
    let dir = tempdir().unwrap();
    let server = start(dir.path().to_path_buf());
    let client = Client::connect(&server);
    let bg = serve_n(server, 1);

    let mut m = SfpMessage::zeroed();
    m.msg_type = 42;
    m.owner = 7;
    let rep = client.roundtrip(&m);
    assert_eq!(rep.msg_type, 43);
    assert_eq!(rep.path_len, StatusError::UNKNOWN_MSG);

    bg.join().unwrap();
}

#[test]
fn directory_lifecycle_over_the_wire() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("A1")).unwrap();
    let server = start(dir.path().to_path_buf());
    let client = Client::connect(&server);
    let bg = serve_n(server, 3);

    let mut dc = req(1, MsgType::DcReq, "/A1");
    dc.set_name("reports");
    let dc_rep = client.roundtrip(&dc);
    assert_eq!(dc_rep.path_str(), "/A1/reports");

    let dl = req(1, MsgType::DlReq, "/A1");
    let dl_rep = client.roundtrip(&dl);
    assert_eq!(dl_rep.dir_entries().collect::<Vec<_>>(), vec![("reports", true)]);

    let mut dr = req(1, MsgType::DrReq, "/A1");
    dr.set_name("reports");
    let dr_rep = client.roundtrip(&dr);
    assert!(dr_rep.path_len >= 0);

    bg.join().unwrap();
}
