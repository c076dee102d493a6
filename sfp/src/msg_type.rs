/// Kind of an [`SfpMessage`](crate::SfpMessage), in the order the original
/// protocol numbers them: every `_REQ` is immediately followed by its `_REP`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    RdReq = 0,
    RdRep = 1,
    WrReq = 2,
    WrRep = 3,
    DcReq = 4,
    DcRep = 5,
    DrReq = 6,
    DrRep = 7,
    DlReq = 8,
    DlRep = 9,
}

impl MsgType {
    /// Decode a raw wire discriminant, if it names a known kind.
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::RdReq),
            1 => Some(Self::RdRep),
            2 => Some(Self::WrReq),
            3 => Some(Self::WrRep),
            4 => Some(Self::DcReq),
            5 => Some(Self::DcRep),
            6 => Some(Self::DrReq),
            7 => Some(Self::DrRep),
            8 => Some(Self::DlReq),
            9 => Some(Self::DlRep),
            _ => None,
        }
    }

    /// True for `_REQ` kinds (the even discriminants).
    pub fn is_request(self) -> bool {
        (self as u32) % 2 == 0
    }

    /// The reply kind that answers this request, or `None` if this is
    /// already a reply kind.
    pub fn reply_kind(self) -> Option<Self> {
        if self.is_request() {
            Self::from_u32(self as u32 + 1)
        } else {
            None
        }
    }
}
