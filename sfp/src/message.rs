use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::msg_type::MsgType;
use crate::path::{normalize_field, read_field};
use crate::{MAX_ALL_FILENAMES_LEN, MAX_NAMES_IN_DIR, MAX_PATH_LEN, PAYLOAD_SIZE};

/// One entry of a directory-listing reply: the half-open... actually
/// *inclusive* `[start, end]` byte range of this entry's name inside
/// `allfilenames`, and whether it names a directory.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FstLst {
    pub start_index: i32,
    pub end_index: i32,
    pub is_dir: i32,
}

/// The single fixed-size record used for every SFP request and reply.
///
/// Field order matches `sfp_protocol.h` exactly: header fields, then the
/// path/name pair, then the file-op fields (`offset`/`payload`), then the
/// directory-listing fields. The overloaded status fields (`offset` for
/// RD/WR, `path_len` for DC/DR, `nrnames` for DL) are plain `i32`s here;
/// [`crate::StatusError::from_status`] is how callers interpret them.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct SfpMessage {
    pub msg_type: u32,
    pub owner: i32,

    pub path_len: i32,
    pub path: [u8; MAX_PATH_LEN],

    pub name_len: i32,
    pub name: [u8; MAX_PATH_LEN],

    pub offset: i32,
    pub payload: [u8; PAYLOAD_SIZE],

    pub nrnames: i32,
    pub fstlstpositions: [FstLst; MAX_NAMES_IN_DIR],
    pub allfilenames: [u8; MAX_ALL_FILENAMES_LEN],
}

impl SfpMessage {
    /// An all-zero message: `msg_type` 0 (`RdReq`), empty path/name,
    /// zeroed payload and directory-listing buffers.
    pub fn zeroed() -> Self {
        zerocopy::FromZeros::new_zeroed()
    }

    pub fn kind(&self) -> Option<MsgType> {
        MsgType::from_u32(self.msg_type)
    }

    pub fn set_kind(&mut self, kind: MsgType) {
        self.msg_type = kind as u32;
    }

    pub fn path_str(&self) -> &str {
        read_field(&self.path)
    }

    pub fn set_path(&mut self, path: &str) {
        self.path_len = normalize_field(&mut self.path, path);
    }

    pub fn name_str(&self) -> &str {
        read_field(&self.name)
    }

    pub fn set_name(&mut self, name: &str) {
        self.name_len = normalize_field(&mut self.name, name);
    }

    /// Overwrite the payload, zero-padding or truncating `data` to
    /// [`PAYLOAD_SIZE`] bytes with no error either way.
    pub fn set_payload(&mut self, data: &[u8]) {
        self.payload.fill(0);
        let n = data.len().min(PAYLOAD_SIZE);
        self.payload[..n].copy_from_slice(&data[..n]);
    }

    /// Append one directory entry, filling in `fstlstpositions` and
    /// `allfilenames` and bumping `nrnames`. Returns `false` (without
    /// mutating anything) if the entry would overflow either the 40-name
    /// cap or the 2048-byte names buffer — callers stop enumerating on the
    /// first `false`.
    pub fn push_dir_entry(&mut self, name: &str, is_dir: bool) -> bool {
        let count = self.nrnames.max(0) as usize;
        let used: usize = self
            .fstlstpositions
            .iter()
            .take(count)
            .map(|e| (e.end_index - e.start_index + 1).max(0) as usize)
            .sum();

        if count >= MAX_NAMES_IN_DIR {
            return false;
        }
        let bytes = name.as_bytes();
        if used + bytes.len() > MAX_ALL_FILENAMES_LEN {
            return false;
        }

        let start = used;
        let end = used + bytes.len() - 1;
        self.allfilenames[start..start + bytes.len()].copy_from_slice(bytes);
        self.fstlstpositions[count] = FstLst {
            start_index: start as i32,
            end_index: end as i32,
            is_dir: is_dir as i32,
        };
        self.nrnames = (count + 1) as i32;
        true
    }

    /// Iterate the directory entries written by [`Self::push_dir_entry`].
    /// Empty (not an error) if `nrnames` is negative, i.e. a status code.
    pub fn dir_entries(&self) -> impl Iterator<Item = (&str, bool)> {
        let count = self.nrnames.max(0) as usize;
        self.fstlstpositions.iter().take(count).map(|e| {
            let start = e.start_index.max(0) as usize;
            let end = (e.end_index + 1).max(start as i32) as usize;
            let name = core::str::from_utf8(&self.allfilenames[start..end]).unwrap_or("");
            (name, e.is_dir != 0)
        })
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.as_bytes()
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        Self::read_from_bytes(buf).ok()
    }
}
