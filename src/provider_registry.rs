//! Provider registry: process-wide map from provider UID to a live provider
//! handle, reusing it while still alive.
//!
//! The mapping is *not* internally synchronized — callers either confine it
//! to one thread or hold their own lock around it, the same
//! caller-synchronized contract the identity registry's factory path relies
//! on. Wrapping it in a mutex here would silently paper over a misuse that
//! should surface to the caller instead.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::engine::Engine;
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::task::BasicTask;
use crate::{ArgValue, ObjectKind};

pub(crate) struct ProviderInner {
    core: HandleCore,
    pub(crate) uid: u64,
}

/// A handle to a remote crypto provider. Cheap to clone: clones share the
/// same underlying proxy, exactly like a second [`ProviderRegistry::get_or_create`]
/// lookup for the same UID would.
#[derive(Clone)]
pub struct Provider(Arc<ProviderInner>);

impl Provider {
    fn create(engine: Arc<Engine>, uid: u64) -> Result<Provider, ClientError> {
        let core = HandleCore::create(
            engine,
            ObjectKind::Provider,
            BasicTask::ProviderCreateFromUid,
            vec![ArgValue::U64(uid)],
        )?;
        Ok(Provider(Arc::new(ProviderInner { core, uid })))
    }

    pub fn uid(&self) -> u64 {
        self.0.uid
    }

    pub fn proxy_id(&self) -> crate::ids::ProxyId {
        self.0.core.proxy_id()
    }

    /// The server's human-readable name for this provider (e.g. a vendor or
    /// backend identifier), a plain value return.
    pub fn name(&self) -> Result<String, ClientError> {
        let outcome = self.0.core.invoke(BasicTask::ProviderGetName, vec![])?;
        let bytes = outcome.expect_bytes(0);
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ClientError(crate::error::DomainErrorKind::UnexpectedValue))
    }

    pub(crate) fn core(&self) -> &HandleCore {
        &self.0.core
    }

    /// A non-owning back-reference, handed to the keyed objects this
    /// provider creates.
    pub(crate) fn weak(&self) -> Weak<ProviderInner> {
        Arc::downgrade(&self.0)
    }
}

/// Maps provider UID to a weak reference on the provider's proxy. A lookup
/// upgrades the weak reference if the provider is still alive somewhere;
/// otherwise the entry is logically absent and a fresh provider is created.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: HashMap<u64, Weak<ProviderInner>>,
}

impl ProviderRegistry {
    pub fn new() -> ProviderRegistry {
        ProviderRegistry {
            entries: HashMap::new(),
        }
    }

    /// Returns the live provider for `uid`, creating one against `engine` if
    /// none is currently alive.
    pub fn get_or_create(&mut self, engine: &Arc<Engine>, uid: u64) -> Result<Provider, ClientError> {
        if let Some(weak) = self.entries.get(&uid) {
            if let Some(inner) = weak.upgrade() {
                return Ok(Provider(inner));
            }
        }
        let provider = Provider::create(engine.clone(), uid)?;
        self.entries.insert(uid, Arc::downgrade(&provider.0));
        Ok(provider)
    }

    /// Drops entries whose provider has no remaining strong holder. Not
    /// required for correctness (`get_or_create` already treats a dead
    /// weak reference as absent) but keeps the map from growing unbounded
    /// across many distinct, short-lived provider UIDs.
    pub fn prune_dead(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{loopback_engine, ScriptedServer};
    use crate::task::DetailTask;
    use crate::message::{IdentifiablePointer, Response};

    #[test]
    fn repeated_lookup_shares_the_same_proxy_id() {
        let server = ScriptedServer::new(move |req| Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                req.new_ids[0],
            ))],
        });
        let engine = loopback_engine(server);
        let mut registry = ProviderRegistry::new();

        let first = registry.get_or_create(&engine, 0xC0FFEE).unwrap();
        let second = registry.get_or_create(&engine, 0xC0FFEE).unwrap();
        assert_eq!(first.proxy_id(), second.proxy_id());
    }

    #[test]
    fn name_decodes_the_servers_utf8_response() {
        let server = ScriptedServer::new(move |req| match req.basic_task {
            BasicTask::ProviderGetName => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::Bytes(b"reference-backend".to_vec())],
            },
            _ => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                    req.new_ids[0],
                ))],
            },
        });
        let engine = loopback_engine(server);
        let mut registry = ProviderRegistry::new();
        let provider = registry.get_or_create(&engine, 0xABCD).unwrap();

        assert_eq!(provider.name().unwrap(), "reference-backend");
    }

    #[test]
    fn a_dropped_provider_is_recreated() {
        let server = ScriptedServer::new(move |req| Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                req.new_ids[0],
            ))],
        });
        let engine = loopback_engine(server);
        let mut registry = ProviderRegistry::new();

        let first_id = {
            let first = registry.get_or_create(&engine, 7).unwrap();
            first.proxy_id()
        };
        registry.prune_dead();
        let second = registry.get_or_create(&engine, 7).unwrap();
        assert_ne!(first_id, second.proxy_id());
    }
}
