//! Request/Response data model and the argument tuple that both share:
//! `[TypeTag u16][Length u32][Payload …]` per entry.

use crate::ids::ProxyId;
use crate::task::{BasicTask, DetailTask};
use crate::x509::Status;

/// Either null or a reference to a proxy id the server assigned. Used to
/// encode the result of a factory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifiablePointer {
    pub is_null: bool,
    pub proxy_id: ProxyId,
}

impl IdentifiablePointer {
    pub fn null() -> IdentifiablePointer {
        IdentifiablePointer {
            is_null: true,
            proxy_id: ProxyId::NONE,
        }
    }

    pub fn of(id: ProxyId) -> IdentifiablePointer {
        IdentifiablePointer {
            is_null: false,
            proxy_id: id,
        }
    }
}

/// One positional element of a request or response argument tuple.
///
/// References to remote objects are always encoded as proxy ids, never by
/// value: there is no variant that embeds another handle's state.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Unit,
    U8(u8),
    U32(u32),
    U64(u64),
    I64(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    ProxyRef(ProxyId),
    ProxyRefVec(Vec<ProxyId>),
    IdentifiablePointer(IdentifiablePointer),
    Status(Status),
    StatusVec(Vec<Status>),
}

impl ArgValue {
    pub(crate) fn type_tag(&self) -> u16 {
        match self {
            ArgValue::Unit => 0,
            ArgValue::U8(_) => 1,
            ArgValue::U32(_) => 2,
            ArgValue::U64(_) => 3,
            ArgValue::I64(_) => 4,
            ArgValue::Bool(_) => 5,
            ArgValue::Bytes(_) => 6,
            ArgValue::ProxyRef(_) => 7,
            ArgValue::ProxyRefVec(_) => 8,
            ArgValue::IdentifiablePointer(_) => 9,
            ArgValue::Status(_) => 10,
            ArgValue::StatusVec(_) => 11,
        }
    }

    /// `true` for the one argument type [`crate::chunking`] is allowed to
    /// split across multiple wire calls.
    pub(crate) fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ArgValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Immutable once built: a client-to-server call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub basic_task: BasicTask,
    pub caller_proxy_id: ProxyId,
    pub args: Vec<ArgValue>,
    /// Pre-allocated ids for factory calls. Empty for calls that do not
    /// create a new object.
    pub new_ids: Vec<ProxyId>,
}

impl Request {
    pub fn new(basic_task: BasicTask, caller_proxy_id: ProxyId, args: Vec<ArgValue>) -> Request {
        Request {
            basic_task,
            caller_proxy_id,
            args,
            new_ids: Vec::new(),
        }
    }

    pub fn with_new_ids(mut self, new_ids: Vec<ProxyId>) -> Request {
        self.new_ids = new_ids;
        self
    }
}

/// Server-to-client reply. `detail_task` is the error channel; `args`
/// mirrors the request's positions: slot 0 carries the return value if the
/// call has one, subsequent slots carry out-parameter images.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub basic_task: BasicTask,
    pub detail_task: DetailTask,
    pub args: Vec<ArgValue>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.detail_task.is_success()
    }
}
