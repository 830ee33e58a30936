//! Error taxonomy (C9): domain errors travel end to end as typed `Result`s;
//! framing/transport/serialization faults are fatal and abort the process,
//! because a partially-consumed wire stream can never be resynchronized.

use std::fmt;

/// Closed set of domain error kinds the server may report for a call.
/// The client never synthesizes one of these; it only decodes what the
/// server sent back on the wire (`DetailTask`, see [`crate::task`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomainErrorKind {
    #[error("allocation failed on the server")]
    BadAlloc,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid input size")]
    InvalidInputSize,
    #[error("insufficient capacity")]
    InsufficientCapacity,
    #[error("invalid usage order")]
    InvalidUsageOrder,
    #[error("incompatible object")]
    IncompatibleObject,
    #[error("incompatible arguments")]
    IncompatibleArguments,
    #[error("unknown identifier")]
    UnknownIdentifier,
    #[error("unsupported operation")]
    Unsupported,
    #[error("unsupported format")]
    UnsupportedFormat,
    #[error("unexpected value")]
    UnexpectedValue,
    #[error("uninitialized context")]
    UninitializedContext,
    #[error("processing not started")]
    ProcessingNotStarted,
    #[error("processing not finished")]
    ProcessingNotFinished,
    #[error("in/out buffers intersect")]
    InOutBuffersIntersect,
    #[error("runtime fault")]
    RuntimeFault,
    #[error("access violation")]
    AccessViolation,
    #[error("content duplication")]
    ContentDuplication,
    #[error("unreserved resource")]
    UnreservedResource,
    #[error("insufficient resource")]
    InsufficientResource,
    #[error("busy resource")]
    BusyResource,
    #[error("empty container")]
    EmptyContainer,
    #[error("usage violation")]
    UsageViolation,
    #[error("above boundary")]
    AboveBoundary,
    #[error("bad object reference")]
    BadObjectReference,
    #[error("incomplete argument state")]
    IncompleteArgState,
}

impl DomainErrorKind {
    /// Numeric wire code. Stable across versions: never renumber an
    /// existing variant, only append.
    pub const fn wire_code(self) -> u32 {
        match self {
            DomainErrorKind::BadAlloc => 1,
            DomainErrorKind::InvalidArgument => 2,
            DomainErrorKind::InvalidInputSize => 3,
            DomainErrorKind::InsufficientCapacity => 4,
            DomainErrorKind::InvalidUsageOrder => 5,
            DomainErrorKind::IncompatibleObject => 6,
            DomainErrorKind::IncompatibleArguments => 7,
            DomainErrorKind::UnknownIdentifier => 8,
            DomainErrorKind::Unsupported => 9,
            DomainErrorKind::UnsupportedFormat => 10,
            DomainErrorKind::UnexpectedValue => 11,
            DomainErrorKind::UninitializedContext => 12,
            DomainErrorKind::ProcessingNotStarted => 13,
            DomainErrorKind::ProcessingNotFinished => 14,
            DomainErrorKind::InOutBuffersIntersect => 15,
            DomainErrorKind::RuntimeFault => 16,
            DomainErrorKind::AccessViolation => 17,
            DomainErrorKind::ContentDuplication => 18,
            DomainErrorKind::UnreservedResource => 19,
            DomainErrorKind::InsufficientResource => 20,
            DomainErrorKind::BusyResource => 21,
            DomainErrorKind::EmptyContainer => 22,
            DomainErrorKind::UsageViolation => 23,
            DomainErrorKind::AboveBoundary => 24,
            DomainErrorKind::BadObjectReference => 25,
            DomainErrorKind::IncompleteArgState => 26,
        }
    }

    /// Reverse of [`Self::wire_code`]. Returns `None` for the reserved
    /// success code (`0`) or any code outside the closed set.
    pub fn from_wire_code(code: u32) -> Option<DomainErrorKind> {
        use DomainErrorKind::*;
        Some(match code {
            1 => BadAlloc,
            2 => InvalidArgument,
            3 => InvalidInputSize,
            4 => InsufficientCapacity,
            5 => InvalidUsageOrder,
            6 => IncompatibleObject,
            7 => IncompatibleArguments,
            8 => UnknownIdentifier,
            9 => Unsupported,
            10 => UnsupportedFormat,
            11 => UnexpectedValue,
            12 => UninitializedContext,
            13 => ProcessingNotStarted,
            14 => ProcessingNotFinished,
            15 => InOutBuffersIntersect,
            16 => RuntimeFault,
            17 => AccessViolation,
            18 => ContentDuplication,
            19 => UnreservedResource,
            20 => InsufficientResource,
            21 => BusyResource,
            22 => EmptyContainer,
            23 => UsageViolation,
            24 => AboveBoundary,
            25 => BadObjectReference,
            26 => IncompleteArgState,
            _ => return None,
        })
    }
}

/// Error returned from a call into the remote service. Only ever carries a
/// domain error: framing faults never reach this type, they abort the
/// process directly (see [`fatal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("remote call failed: {0}")]
pub struct ClientError(#[from] pub DomainErrorKind);

impl ClientError {
    pub fn kind(&self) -> DomainErrorKind {
        self.0
    }
}

/// A framing-level fault: malformed wire bytes, a transport I/O error, or a
/// serialize-time programmer error (e.g. an argument tuple too large to
/// represent). These are never recoverable in-process: the peer and this
/// process have desynchronized on the shape of the stream, so every
/// subsequent read would be garbage. The only correct response is to log
/// enough to diagnose after the fact and abort.
pub struct FramingFault {
    message: String,
    location: &'static std::panic::Location<'static>,
}

impl fmt::Display for FramingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

impl FramingFault {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> FramingFault {
        FramingFault {
            message: message.into(),
            location: std::panic::Location::caller(),
        }
    }
}

/// Logs the fault and aborts the process. Never returns.
///
/// This is the only place in the crate that may call [`std::process::abort`];
/// every framing-level failure path routes through here instead of
/// propagating a `Result`, per the fatal-abort policy of the error taxonomy.
#[track_caller]
pub fn fatal(fault: FramingFault) -> ! {
    tracing::error!(target: "cryptoipc::framing", "{}", fault);
    std::process::abort()
}
