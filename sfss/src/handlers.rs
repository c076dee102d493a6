//! Request handlers: one per SFP operation, each building the full reply
//! record in place rather than returning a bare status, per the protocol's
//! "single message shape for request and reply" design.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use sfp::{MsgType, PAYLOAD_SIZE, SfpMessage, StatusError, is_allowed};

/// Dispatch one request to its handler, or build the generic
/// "unknown message" reply for anything that isn't a recognized `_REQ`.
pub fn handle(req: &SfpMessage, root: &Path) -> SfpMessage {
    match req.kind() {
        Some(MsgType::RdReq) => handle_rd(req, root),
        Some(MsgType::WrReq) => handle_wr(req, root),
        Some(MsgType::DcReq) => handle_dc(req, root),
        Some(MsgType::DrReq) => handle_dr(req, root),
        Some(MsgType::DlReq) => handle_dl(req, root),
        _ => unknown(req),
    }
}

fn unknown(req: &SfpMessage) -> SfpMessage {
    warn!(
        "received unknown message type {} from owner {}",
        req.msg_type, req.owner
    );
    let mut rep = SfpMessage::zeroed();
    rep.msg_type = req.msg_type.wrapping_add(1);
    rep.owner = req.owner;
    rep.path_len = StatusError::UNKNOWN_MSG;
    rep
}

/// `root + path`, with the leading `/` of `path` stripped so `Path::join`
/// doesn't discard `root`.
fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

fn handle_rd(req: &SfpMessage, root: &Path) -> SfpMessage {
    let mut rep = SfpMessage::zeroed();
    rep.set_kind(MsgType::RdRep);
    rep.owner = req.owner;
    rep.set_path(req.path_str());
    rep.offset = req.offset;

    if !is_allowed(req.owner.max(0) as u32, req.path_str()) {
        warn!(
            "RD permission denied: owner {} tried to access {}",
            req.owner,
            req.path_str()
        );
        rep.offset = StatusError::PERMISSION;
        return rep;
    }

    let full = resolve(root, req.path_str());
    let data = match fs::read(&full) {
        Ok(d) => d,
        Err(_) => {
            warn!("RD not found: {}", full.display());
            rep.offset = StatusError::NOT_FOUND;
            return rep;
        }
    };

    let size = data.len();
    let offset = req.offset;
    if offset < 0 || (offset as usize >= size && !(size == 0 && offset == 0)) {
        warn!("RD offset out of bounds: size={size}, offset={offset}");
        rep.offset = StatusError::OFFSET_OOB;
        return rep;
    }

    let start = offset as usize;
    let end = (start + PAYLOAD_SIZE).min(size);
    rep.set_payload(&data[start..end]);
    rep.offset = req.offset;
    debug!(
        "RD success: {} @ {} ({} bytes)",
        full.display(),
        offset,
        end - start
    );
    rep
}

fn handle_wr(req: &SfpMessage, root: &Path) -> SfpMessage {
    let mut rep = SfpMessage::zeroed();
    rep.set_kind(MsgType::WrRep);
    rep.owner = req.owner;
    rep.set_path(req.path_str());
    rep.offset = req.offset;

    if !is_allowed(req.owner.max(0) as u32, req.path_str()) {
        warn!(
            "WR permission denied: owner {} tried to access {}",
            req.owner,
            req.path_str()
        );
        rep.offset = StatusError::PERMISSION;
        return rep;
    }

    let full = resolve(root, req.path_str());

    // Special delete case: offset 0 and an empty (nul-first) payload.
    if req.offset == 0 && req.payload[0] == 0 {
        return match fs::remove_file(&full) {
            Ok(()) => {
                debug!("WR removed {}", full.display());
                rep.offset = StatusError::SUCCESS;
                rep
            }
            Err(e) => {
                warn!("WR remove failed for {}: {e}", full.display());
                rep.offset = StatusError::IO;
                rep
            }
        };
    }

    let mut file = match OpenOptions::new().write(true).open(&full) {
        Ok(f) => f,
        Err(_) => match OpenOptions::new().write(true).create(true).open(&full) {
            Ok(f) => f,
            Err(e) => {
                warn!("WR failed to create {}: {e}", full.display());
                rep.offset = StatusError::NOT_FOUND;
                return rep;
            }
        },
    };

    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    let offset = req.offset.max(0) as u64;

    if offset > size {
        debug!("WR filling hole {size}..{offset} in {}", full.display());
        if file.seek(SeekFrom::End(0)).is_err() {
            rep.offset = StatusError::IO;
            return rep;
        }
        let gap = vec![0x20u8; (offset - size) as usize];
        if file.write_all(&gap).is_err() {
            rep.offset = StatusError::IO;
            return rep;
        }
    }

    if file.seek(SeekFrom::Start(offset)).is_err() || file.write_all(&req.payload).is_err() {
        warn!("WR write failed for {}", full.display());
        rep.offset = StatusError::IO;
        return rep;
    }

    debug!("WR success: {} @ {}", full.display(), offset);
    rep.offset = req.offset;
    rep
}

fn handle_dc(req: &SfpMessage, root: &Path) -> SfpMessage {
    let mut rep = SfpMessage::zeroed();
    rep.set_kind(MsgType::DcRep);
    rep.owner = req.owner;
    rep.set_path(req.path_str());

    if !is_allowed(req.owner.max(0) as u32, req.path_str()) {
        warn!(
            "DC permission denied: owner {} tried to create in {}",
            req.owner,
            req.path_str()
        );
        rep.path_len = StatusError::PERMISSION;
        return rep;
    }

    let full = resolve(root, req.path_str()).join(req.name_str());
    match fs::create_dir(&full) {
        Ok(()) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(&full, fs::Permissions::from_mode(0o755));
            }
            let reply_path = format!("{}/{}", req.path_str(), req.name_str());
            debug!("DC created {}", full.display());
            rep.set_path(&reply_path);
        }
        Err(e) => {
            warn!("DC failed for {}: {e}", full.display());
            rep.path_len = StatusError::IO;
        }
    }
    rep
}

fn handle_dr(req: &SfpMessage, root: &Path) -> SfpMessage {
    let mut rep = SfpMessage::zeroed();
    rep.set_kind(MsgType::DrRep);
    rep.owner = req.owner;
    rep.set_path(req.path_str());

    if !is_allowed(req.owner.max(0) as u32, req.path_str()) {
        warn!(
            "DR permission denied: owner {} tried to remove from {}",
            req.owner,
            req.path_str()
        );
        rep.path_len = StatusError::PERMISSION;
        return rep;
    }

    let target = resolve(root, req.path_str()).join(req.name_str());
    let removed = fs::remove_file(&target).is_ok() || fs::remove_dir(&target).is_ok();
    if removed {
        debug!("DR removed {}", target.display());
    } else {
        warn!("DR failed to remove {}", target.display());
        rep.path_len = StatusError::IO;
    }
    rep
}

fn handle_dl(req: &SfpMessage, root: &Path) -> SfpMessage {
    let mut rep = SfpMessage::zeroed();
    rep.set_kind(MsgType::DlRep);
    rep.owner = req.owner;

    if !is_allowed(req.owner.max(0) as u32, req.path_str()) {
        warn!(
            "DL permission denied: owner {} tried to list {}",
            req.owner,
            req.path_str()
        );
        rep.nrnames = StatusError::PERMISSION;
        return rep;
    }

    let full = resolve(root, req.path_str());
    let entries = match fs::read_dir(&full) {
        Ok(it) => it,
        Err(_) => {
            warn!("DL not found: {}", full.display());
            rep.nrnames = StatusError::NOT_FOUND;
            return rep;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "." || name == ".." {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !rep.push_dir_entry(&name, is_dir) {
            debug!("DL truncated listing of {}", full.display());
            break;
        }
    }
    debug!("DL listed {} entries in {}", rep.nrnames, full.display());
    rep
}
