//! Identity Registry (C3): assigns process-unique [`ProxyId`]s.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier for a proxy object. Shared verbatim with the
/// server, which uses it as the key into its skeleton table.
///
/// `0` is reserved as the wire "no caller" / "null pointer" marker (see
/// [`crate::message::IdentifiablePointer`]) and is never handed out by
/// [`IdentityRegistry::fresh_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyId(u64);

impl ProxyId {
    /// The reserved "no object" id used as a caller id for calls that are not
    /// scoped to an existing handle (e.g. obtaining a provider by UID).
    pub const NONE: ProxyId = ProxyId(0);

    pub(crate) const fn from_raw(raw: u64) -> ProxyId {
        ProxyId(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Assigns process-unique [`ProxyId`]s, one counter per [`crate::engine::Engine`]
/// (i.e. per transport session). Ids are a monotonic counter rather than
/// derived from the local handle's address: addresses get reused once a
/// handle is freed, which would violate "ids are never reused while any
/// message referencing them may still be in flight" the moment an old
/// request is still in flight when a new handle lands on the same address.
#[derive(Debug)]
pub struct IdentityRegistry {
    next: AtomicU64,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        IdentityRegistry::new()
    }
}

impl IdentityRegistry {
    pub fn new() -> IdentityRegistry {
        IdentityRegistry {
            next: AtomicU64::new(1),
        }
    }

    /// Produces an id unique for the lifetime of this registry.
    pub fn fresh_id(&self) -> ProxyId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        ProxyId::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_zero() {
        let reg = IdentityRegistry::new();
        let a = reg.fresh_id();
        let b = reg.fresh_id();
        assert_ne!(a, b);
        assert!(a.as_raw() > 0);
        assert!(b.as_raw() > a.as_raw());
    }

    #[test]
    fn none_is_reserved() {
        assert!(ProxyId::NONE.is_none());
        let reg = IdentityRegistry::new();
        assert_ne!(reg.fresh_id(), ProxyId::NONE);
    }
}
