//! Simulated File Protocol (SFP).
//!
//! A single fixed-size record ([`SfpMessage`]) is used, uniformly, for every
//! request and reply exchanged between the kernel and SFSS. Both endpoints
//! agree on field order and size; the in-memory layout is the wire layout.

mod message;
mod msg_type;
mod path;
mod permission;
mod status;

pub use message::{FstLst, SfpMessage};
pub use msg_type::MsgType;
pub use path::normalize_field;
pub use permission::is_allowed;
pub use status::StatusError;

/// Bytes carried by a single read/write payload.
pub const PAYLOAD_SIZE: usize = 16;
/// Maximum number of entries a directory listing reply can carry.
pub const MAX_NAMES_IN_DIR: usize = 40;
/// Maximum length (including the trailing nul) of a path or name field.
pub const MAX_PATH_LEN: usize = 512;
/// Maximum length of the concatenated-names buffer in a directory listing.
pub const MAX_ALL_FILENAMES_LEN: usize = 2048;
