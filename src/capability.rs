//! Capability traits: cross-cutting contracts (identifiable, serializable,
//! keyed, reset-able) layered over a closed enum of handle kinds instead of
//! per-kind virtual dispatch. Each trait here is a thin, zero-cost layer a
//! per-kind shim opts into by forwarding to its [`crate::handle::HandleCore`];
//! the engine itself never needs to know which capabilities a given call
//! site has.

use crate::error::ClientError;
use crate::ids::ProxyId;

/// Every typed handle is identifiable: it carries a proxy id, process-unique
/// for the lifetime of the session that minted it.
pub trait Identifiable {
    fn proxy_id(&self) -> ProxyId;
}

/// A handle whose server-side state can be exported to an opaque blob
/// (keys, domain parameters, trusted containers) for storage or transfer.
pub trait Serializable: Identifiable {
    fn export(&self) -> Result<Vec<u8>, ClientError>;
}

/// A handle that holds a non-owning back-reference to the provider that
/// created it.
pub trait Keyed: Identifiable {
    /// `None` if the owning provider has since been dropped everywhere —
    /// harmless for a keyed object, whose own skeleton the provider
    /// outlives by construction.
    fn provider_uid(&self) -> Option<u64>;
}

/// A handle whose multi-step state machine (Start/Update/Finish) can be
/// rewound in place instead of requiring a fresh factory call.
pub trait ResetAble: Identifiable {
    fn reset(&self) -> Result<(), ClientError>;
}
