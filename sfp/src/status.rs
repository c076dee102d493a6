/// The error taxonomy SFSS and the kernel share.
///
/// Replies overload a numeric field (`offset` for file ops, `path_len` for
/// directory create/remove, `nrnames` for directory listing) as a status
/// channel: non-negative means success, negative is one of these codes.
/// Implementations must preserve the exact codes below for wire
/// compatibility; [`StatusError`] exists so the rest of the code can match
/// on a tagged error instead of a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("permission denied")]
    Permission,
    #[error("not found")]
    NotFound,
    #[error("offset out of bounds")]
    OffsetOutOfBounds,
    #[error("I/O error")]
    Io,
    #[error("unknown message")]
    UnknownMessage,
}

impl StatusError {
    pub const SUCCESS: i32 = 0;
    pub const PERMISSION: i32 = -1;
    pub const NOT_FOUND: i32 = -2;
    pub const OFFSET_OOB: i32 = -3;
    pub const IO: i32 = -4;
    pub const UNKNOWN_MSG: i32 = -100;

    /// The wire code for this error.
    pub fn code(self) -> i32 {
        match self {
            Self::Permission => Self::PERMISSION,
            Self::NotFound => Self::NOT_FOUND,
            Self::OffsetOutOfBounds => Self::OFFSET_OOB,
            Self::Io => Self::IO,
            Self::UnknownMessage => Self::UNKNOWN_MSG,
        }
    }

    /// Decode a status field into `Ok(value)` on success or the matching
    /// error on a known negative code. An unrecognized negative value is
    /// reported as [`StatusError::Io`], since the wire taxonomy has no
    /// "unknown error" slot of its own.
    pub fn from_status(value: i32) -> Result<i32, Self> {
        match value {
            v if v >= 0 => Ok(v),
            Self::PERMISSION => Err(Self::Permission),
            Self::NOT_FOUND => Err(Self::NotFound),
            Self::OFFSET_OOB => Err(Self::OffsetOutOfBounds),
            Self::UNKNOWN_MSG => Err(Self::UnknownMessage),
            _ => Err(Self::Io),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_values_pass_through() {
        assert_eq!(StatusError::from_status(0), Ok(0));
        assert_eq!(StatusError::from_status(16), Ok(16));
    }

    #[test]
    fn known_codes_decode() {
        assert_eq!(
            StatusError::from_status(StatusError::PERMISSION),
            Err(StatusError::Permission)
        );
        assert_eq!(
            StatusError::from_status(StatusError::UNKNOWN_MSG),
            Err(StatusError::UnknownMessage)
        );
    }

    #[test]
    fn code_round_trips() {
        for err in [
            StatusError::Permission,
            StatusError::NotFound,
            StatusError::OffsetOutOfBounds,
            StatusError::Io,
            StatusError::UnknownMessage,
        ] {
            assert_eq!(StatusError::from_status(err.code()), Err(err));
        }
    }
}
