//! Handle lifecycle: the creation protocol and destroy-on-drop semantics,
//! composed into one `HandleCore` every typed handle in [`crate::handles`]
//! aggregates.

use std::sync::{Arc, Weak};

use crate::engine::{CallOutcome, Engine};
use crate::error::ClientError;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::{Provider, ProviderInner};
use crate::task::BasicTask;
use crate::ObjectKind;

/// Owns a proxy id slot and, while `send_destroy_flag` is set, the
/// corresponding server-side skeleton. `Drop` enqueues a best-effort
/// destroy message; a handle whose creation the server rejected never sets
/// the flag, so its `Drop` is silent.
pub struct HandleCore {
    proxy_id: ProxyId,
    object_kind: ObjectKind,
    engine: Arc<Engine>,
    send_destroy_flag: bool,
    owning_provider: Option<Weak<ProviderInner>>,
}

impl HandleCore {
    /// Runs the creation protocol for a handle with no owning caller proxy
    /// (obtained straight from a provider UID, say).
    pub fn create(
        engine: Arc<Engine>,
        object_kind: ObjectKind,
        task: BasicTask,
        args: Vec<ArgValue>,
    ) -> Result<HandleCore, ClientError> {
        Self::create_for_caller(engine, object_kind, task, ProxyId::NONE, args)
    }

    /// Runs the creation protocol for a factory call made *on* an existing
    /// handle (e.g. a KDF deriving a new key): `caller` is that handle's
    /// proxy id.
    pub fn create_for_caller(
        engine: Arc<Engine>,
        object_kind: ObjectKind,
        task: BasicTask,
        caller: ProxyId,
        args: Vec<ArgValue>,
    ) -> Result<HandleCore, ClientError> {
        let new_id = engine.fresh_id();
        // Allocated locally with send_destroy_flag=false before the request
        // is even built. If anything below returns early, this value is
        // simply dropped — its Drop impl is a no-op.
        let mut core = HandleCore {
            proxy_id: new_id,
            object_kind,
            engine: engine.clone(),
            send_destroy_flag: false,
            owning_provider: None,
        };
        engine.call_factory(task, caller, args, new_id)?;
        // The server confirmed creation under `new_id`.
        core.send_destroy_flag = true;
        Ok(core)
    }

    /// Pre-creates one candidate for a vector-of-handles out-parameter:
    /// the id is allocated up front and travels in the *caller's* request;
    /// this candidate sends no request of its own.
    pub(crate) fn candidate(engine: Arc<Engine>, object_kind: ObjectKind) -> HandleCore {
        let proxy_id = engine.fresh_id();
        HandleCore {
            proxy_id,
            object_kind,
            engine,
            send_destroy_flag: false,
            owning_provider: None,
        }
    }

    /// Marks a [`HandleCore::candidate`] as one of the `k` the server
    /// actually used. Candidates that are never confirmed keep
    /// `send_destroy_flag=false` and so never emit a destroy message.
    pub(crate) fn confirm(&mut self) {
        self.send_destroy_flag = true;
    }

    /// Attaches the non-owning back-reference a keyed object carries to the
    /// provider that created it.
    pub fn with_provider(mut self, provider: &Provider) -> HandleCore {
        self.owning_provider = Some(provider.weak());
        self
    }

    pub fn proxy_id(&self) -> ProxyId {
        self.proxy_id
    }

    pub fn object_kind(&self) -> ObjectKind {
        self.object_kind
    }

    pub fn provider_uid(&self) -> Option<u64> {
        self.owning_provider.as_ref()?.upgrade().map(|inner| inner.uid)
    }

    pub(crate) fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Forwards an ordinary method call to the Invocation Engine with this
    /// handle's proxy id as the caller.
    pub fn invoke(&self, task: BasicTask, args: Vec<ArgValue>) -> Result<CallOutcome, ClientError> {
        self.engine.call(task, self.proxy_id, args)
    }

    /// Chunked variant of [`HandleCore::invoke`] for calls carrying one
    /// oversized region.
    pub fn invoke_chunked(
        &self,
        task: BasicTask,
        region: &[u8],
        wrap: impl Fn(&[u8]) -> Vec<ArgValue>,
    ) -> Result<CallOutcome, ClientError> {
        self.engine.call_chunked(task, self.proxy_id, region, wrap)
    }

    /// Triggers drop semantics immediately instead of waiting for scope
    /// exit.
    pub fn release(mut self) {
        self.send_destroy_now();
    }

    fn send_destroy_now(&mut self) {
        if self.send_destroy_flag {
            self.engine.try_send_destroy(self.proxy_id);
            self.send_destroy_flag = false;
        }
    }
}

impl Drop for HandleCore {
    fn drop(&mut self) {
        self.send_destroy_now();
    }
}

impl crate::capability::Identifiable for HandleCore {
    fn proxy_id(&self) -> ProxyId {
        self.proxy_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{IdentifiablePointer, Response};
    use crate::task::DetailTask;
    use crate::testutil::{loopback_engine, RecordingTransport, ScriptedServer};

    #[test]
    fn successful_creation_sets_the_destroy_flag_and_destroy_fires_on_drop() {
        let transport = RecordingTransport::wrap(ScriptedServer::new(|req| Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                req.new_ids[0],
            ))],
        }));
        let sent = transport.sent_requests();
        let engine = Engine::new(Box::new(transport), crate::config::ClientConfig::new());

        let core =
            HandleCore::create(engine, ObjectKind::HashContext, BasicTask::HashCreate, vec![]).unwrap();
        let id = core.proxy_id();
        drop(core);

        let requests = sent.lock().unwrap();
        assert_eq!(requests.len(), 2); // create, then destroy
        assert_eq!(requests[1].basic_task, BasicTask::DestroyProxy);
        assert_eq!(requests[1].caller_proxy_id, id);
    }

    #[test]
    fn failed_creation_sends_no_destroy_message() {
        let transport = RecordingTransport::wrap(ScriptedServer::new(|req| Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::from(crate::error::DomainErrorKind::UnknownIdentifier),
            args: vec![],
        }));
        let sent = transport.sent_requests();
        let engine = Engine::new(Box::new(transport), crate::config::ClientConfig::new());

        let result =
            HandleCore::create(engine, ObjectKind::CipherContext, BasicTask::CipherCreate, vec![]);
        assert!(result.is_err());
        drop(result);

        let requests = sent.lock().unwrap();
        assert_eq!(requests.len(), 1); // only the failed create, no destroy
    }

    #[test]
    fn release_sends_destroy_immediately_and_drop_is_then_silent() {
        let transport = RecordingTransport::wrap(ScriptedServer::new(|req| Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                req.new_ids[0],
            ))],
        }));
        let sent = transport.sent_requests();
        let engine = Engine::new(Box::new(transport), crate::config::ClientConfig::new());

        let core = HandleCore::create(engine, ObjectKind::Mac, BasicTask::MacCreate, vec![]).unwrap();
        core.release();

        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn drop_after_transport_loss_does_not_abort() {
        // Dropping a live handle after the transport endpoint has closed
        // must not panic or abort — the destroy message is simply never
        // delivered.
        let engine = Engine::new(
            Box::new(crate::testutil::FailingTransport),
            crate::config::ClientConfig::new(),
        );
        engine.try_send_destroy(ProxyId::from_raw(42));
    }
}
