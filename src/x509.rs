//! X.509 Verification Contract (C10): the client-visible status state
//! machine attached to certificate handles. The client never infers a
//! status transition; every mutation is driven by a server response to one
//! of the three verification-category calls.

/// Verification verdict attached to a certificate handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Unknown = 0,
    Valid = 1,
    Invalid = 2,
    Expired = 3,
    NoTrust = 4,
    Revoked = 5,
    Incompatible = 6,
}

impl Status {
    pub const fn wire_code(self) -> u8 {
        self as u8
    }

    pub fn from_wire_code(code: u8) -> Option<Status> {
        Some(match code {
            0 => Status::Unknown,
            1 => Status::Valid,
            2 => Status::Invalid,
            3 => Status::Expired,
            4 => Status::NoTrust,
            5 => Status::Revoked,
            6 => Status::Incompatible,
            _ => return None,
        })
    }
}

impl Default for Status {
    fn default() -> Status {
        Status::Unknown
    }
}
