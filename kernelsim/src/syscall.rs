//! Parses the plaintext lines apps write to the kernel and turns a
//! syscall line into the SFP request it corresponds to.

use sfp::{MsgType, SfpMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum AppLine {
    Tick { app_id: u32, pid: i32, pc: i32 },
    Done { app_id: u32, pid: i32, pc: i32 },
    Syscall(SyscallRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyscallRequest {
    pub app_id: u32,
    pub pid: i32,
    pub kind: SyscallKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyscallKind {
    Read { path: String, offset: i32 },
    Write { path: String, offset: i32, payload_token: String },
    Add { path: String, name: String },
    Rem { path: String, name: String },
    ListDir { path: String },
}

impl SyscallRequest {
    /// The wait class this syscall's reply belongs on: file ops (RD/WR) go
    /// on the file wait queue and IRQ1; directory ops (ADD/REM/LISTDIR) go
    /// on the directory wait queue and IRQ2.
    pub fn is_file_op(&self) -> bool {
        matches!(self.kind, SyscallKind::Read { .. } | SyscallKind::Write { .. })
    }

    /// Build the SFP request datagram for this syscall, following the wire
    /// record's field layout and payload/path normalization rules.
    pub fn to_sfp_message(&self) -> SfpMessage {
        let mut msg = SfpMessage::zeroed();
        msg.owner = self.app_id as i32;
        match &self.kind {
            SyscallKind::Read { path, offset } => {
                msg.set_kind(MsgType::RdReq);
                msg.set_path(path);
                msg.offset = *offset;
            }
            SyscallKind::Write {
                path,
                offset,
                payload_token,
            } => {
                msg.set_kind(MsgType::WrReq);
                msg.set_path(path);
                msg.offset = *offset;
                msg.set_payload(payload_token.as_bytes());
            }
            SyscallKind::Add { path, name } => {
                msg.set_kind(MsgType::DcReq);
                msg.set_path(path);
                msg.set_name(name);
            }
            SyscallKind::Rem { path, name } => {
                msg.set_kind(MsgType::DrReq);
                msg.set_path(path);
                msg.set_name(name);
            }
            SyscallKind::ListDir { path } => {
                msg.set_kind(MsgType::DlReq);
                msg.set_path(path);
            }
        }
        msg
    }
}

fn parse_app_id(tok: &str) -> Option<u32> {
    tok.strip_prefix('A')?.parse().ok()
}

/// Parse one line from the app channel. Tokens are whitespace-separated and
/// tolerant of repeated whitespace; an unrecognized verb or malformed line
/// returns `None` so the caller can log the line and discard it.
pub fn parse_app_line(line: &str) -> Option<AppLine> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next()?;
    let app_tok = tokens.next()?;
    let app_id = parse_app_id(app_tok)?;
    let pid: i32 = tokens.next()?.parse().ok()?;

    match verb {
        "TICK" => {
            let pc: i32 = tokens.next()?.parse().ok()?;
            Some(AppLine::Tick { app_id, pid, pc })
        }
        "DONE" => {
            let pc: i32 = tokens.next()?.parse().ok()?;
            Some(AppLine::Done { app_id, pid, pc })
        }
        "READ" => {
            let path = tokens.next()?.to_string();
            let offset: i32 = tokens.next()?.parse().ok()?;
            Some(AppLine::Syscall(SyscallRequest {
                app_id,
                pid,
                kind: SyscallKind::Read { path, offset },
            }))
        }
        "WRITE" => {
            let path = tokens.next()?.to_string();
            let offset: i32 = tokens.next()?.parse().ok()?;
            let payload_token = tokens.next()?.to_string();
            Some(AppLine::Syscall(SyscallRequest {
                app_id,
                pid,
                kind: SyscallKind::Write {
                    path,
                    offset,
                    payload_token,
                },
            }))
        }
        "ADD" => {
            let path = tokens.next()?.to_string();
            let name = tokens.next()?.to_string();
            Some(AppLine::Syscall(SyscallRequest {
                app_id,
                pid,
                kind: SyscallKind::Add { path, name },
            }))
        }
        "REM" => {
            let path = tokens.next()?.to_string();
            let name = tokens.next()?.to_string();
            Some(AppLine::Syscall(SyscallRequest {
                app_id,
                pid,
                kind: SyscallKind::Rem { path, name },
            }))
        }
        "LISTDIR" => {
            let path = tokens.next()?.to_string();
            Some(AppLine::Syscall(SyscallRequest {
                app_id,
                pid,
                kind: SyscallKind::ListDir { path },
            }))
        }
        _ => None,
    }
}
