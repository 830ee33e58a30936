//! Invocation engine: the single choke point every other component routes
//! a remote call through. Builds a [`Request`], drives one [`Channel`]
//! round trip, decodes the [`Response`], and turns a non-success
//! `DetailTask` into a typed [`ClientError`].

use std::sync::Arc;

use crate::chunking::chunk_plan;
use crate::codec::{deserialize_response, predict_size, serialize_request};
use crate::config::ClientConfig;
use crate::error::{fatal, ClientError, FramingFault};
use crate::ids::{IdentityRegistry, ProxyId};
use crate::message::{ArgValue, Request, Response};
use crate::task::BasicTask;
use crate::transport::{Channel, Transport};

/// The positional argument tuple a successful call returned: slot 0 carries
/// the return value if the call has one, subsequent slots carry
/// out-parameter images. Per-kind shims index into this themselves; only
/// they know their own call's shape.
pub struct CallOutcome {
    pub args: Vec<ArgValue>,
}

impl CallOutcome {
    /// A response with fewer slots than the call site expects means the
    /// server sent a reply that doesn't match what this call is supposed
    /// to return — a framing fault, not a recoverable error.
    pub fn arg(&self, index: usize) -> &ArgValue {
        self.args.get(index).unwrap_or_else(|| {
            fatal(FramingFault::new(format!(
                "expected arg at slot {index}, response had {} slots",
                self.args.len()
            )))
        })
    }

    pub fn expect_u32(&self, index: usize) -> u32 {
        match self.arg(index) {
            ArgValue::U32(v) => *v,
            other => fatal(FramingFault::new(format!("expected U32 at slot {index}, got {other:?}"))),
        }
    }

    pub fn expect_bool(&self, index: usize) -> bool {
        match self.arg(index) {
            ArgValue::Bool(v) => *v,
            other => fatal(FramingFault::new(format!("expected Bool at slot {index}, got {other:?}"))),
        }
    }

    pub fn expect_bytes(&self, index: usize) -> &[u8] {
        match self.arg(index) {
            ArgValue::Bytes(v) => v,
            other => fatal(FramingFault::new(format!("expected Bytes at slot {index}, got {other:?}"))),
        }
    }

    pub fn expect_proxy_ref(&self, index: usize) -> ProxyId {
        match self.arg(index) {
            ArgValue::ProxyRef(id) => *id,
            other => fatal(FramingFault::new(format!("expected ProxyRef at slot {index}, got {other:?}"))),
        }
    }

    pub fn expect_status(&self, index: usize) -> crate::x509::Status {
        match self.arg(index) {
            ArgValue::Status(s) => *s,
            other => fatal(FramingFault::new(format!("expected Status at slot {index}, got {other:?}"))),
        }
    }

    pub fn expect_status_vec(&self, index: usize) -> &[crate::x509::Status] {
        match self.arg(index) {
            ArgValue::StatusVec(v) => v,
            other => fatal(FramingFault::new(format!("expected StatusVec at slot {index}, got {other:?}"))),
        }
    }
}

/// Wires one [`Channel`] (C1), the [`IdentityRegistry`] (C3) minting ids for
/// this session, and the [`ClientConfig`] tunables together behind the one
/// `Arc` every handle shares.
pub struct Engine {
    channel: Arc<Channel>,
    registry: IdentityRegistry,
    config: ClientConfig,
}

impl Engine {
    pub fn new(transport: Box<dyn Transport>, config: ClientConfig) -> Arc<Engine> {
        Arc::new(Engine {
            channel: Channel::new(transport),
            registry: IdentityRegistry::new(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fresh_id(&self) -> ProxyId {
        self.registry.fresh_id()
    }

    /// An ordinary call: neither creates nor destroys a remote object.
    pub fn call(&self, task: BasicTask, caller: ProxyId, args: Vec<ArgValue>) -> Result<CallOutcome, ClientError> {
        self.dispatch(Request::new(task, caller, args))
    }

    /// Factory call confirming exactly one pre-allocated id. On success
    /// the server's `IdentifiablePointer` is checked against
    /// `new_id`: any other shape is a protocol-version mismatch, not a
    /// recoverable error.
    pub fn call_factory(
        &self,
        task: BasicTask,
        caller: ProxyId,
        args: Vec<ArgValue>,
        new_id: ProxyId,
    ) -> Result<(), ClientError> {
        let request = Request::new(task, caller, args).with_new_ids(vec![new_id]);
        let outcome = self.dispatch(request)?;
        match outcome.args.first() {
            Some(ArgValue::IdentifiablePointer(ptr)) if !ptr.is_null && ptr.proxy_id == new_id => Ok(()),
            Some(ArgValue::IdentifiablePointer(ptr)) if ptr.is_null => {
                fatal(FramingFault::new("factory call succeeded but returned a null pointer"))
            }
            Some(other) => fatal(FramingFault::new(format!(
                "factory call's first argument was not an identifiable pointer: {other:?}"
            ))),
            None => fatal(FramingFault::new("factory call returned no arguments")),
        }
    }

    /// Vector-of-handles out-parameter: `candidate_ids` travels as the
    /// request's pre-allocated ids; the response's first argument is
    /// the confirmed count `k ≤ candidate_ids.len()`. Which `k` of the
    /// candidates to confirm, and dropping the rest, is the caller's job —
    /// the engine only reports the count the server actually used.
    pub fn call_vector_factory(
        &self,
        task: BasicTask,
        caller: ProxyId,
        args: Vec<ArgValue>,
        candidate_ids: Vec<ProxyId>,
    ) -> Result<usize, ClientError> {
        let requested = candidate_ids.len();
        let request = Request::new(task, caller, args).with_new_ids(candidate_ids);
        let outcome = self.dispatch(request)?;
        match outcome.args.first() {
            Some(ArgValue::U32(k)) if (*k as usize) <= requested => Ok(*k as usize),
            Some(ArgValue::U32(k)) => fatal(FramingFault::new(format!(
                "server confirmed {k} handles but only {requested} candidates were offered"
            ))),
            Some(other) => fatal(FramingFault::new(format!(
                "vector factory call's first argument was not a count: {other:?}"
            ))),
            None => fatal(FramingFault::new("vector factory call returned no arguments")),
        }
    }

    /// Splits `region` per [`chunk_plan`] when the predicted wire size of
    /// `wrap(region)` exceeds the configured maximum request size,
    /// re-issuing `task` once per slice. `wrap` rebuilds the full argument
    /// tuple for one slice; the engine only knows which argument is the
    /// chunkable region through
    /// [`predict_size`]'s per-message-overhead split, not its position.
    /// Idempotent calls like `Update` only need the last response back
    /// ("last result wins"); that is what this returns.
    ///
    /// The size probe wraps an empty slice rather than `region` itself, so
    /// measuring the predicted size of a call whose region turns out to be
    /// far over budget never clones the whole oversized region just to
    /// throw the clone away — exactly the input size chunking exists for.
    pub fn call_chunked(
        &self,
        task: BasicTask,
        caller: ProxyId,
        region: &[u8],
        wrap: impl Fn(&[u8]) -> Vec<ArgValue>,
    ) -> Result<CallOutcome, ClientError> {
        let (_, per_msg_overhead) = predict_size(task, caller, &wrap(&[]));
        let predicted_total = per_msg_overhead + region.len();
        if predicted_total <= self.config.max_request_size() {
            return self.call(task, caller, wrap(region));
        }
        let plan = chunk_plan(region.len(), self.config.max_request_size(), per_msg_overhead);
        let mut last = None;
        for (offset, len) in plan {
            let slice = &region[offset..offset + len];
            last = Some(self.call(task, caller, wrap(slice))?);
        }
        Ok(last.expect("chunk_plan always yields at least one slice"))
    }

    /// Best-effort teardown message: swallows any transport failure instead
    /// of escalating it to [`fatal`], since by
    /// the time a handle drops the session may already be torn down and the
    /// server is responsible for reaping orphans on its own.
    pub fn try_send_destroy(&self, proxy_id: ProxyId) {
        let request = Request::new(BasicTask::DestroyProxy, proxy_id, vec![]);
        let _ = self.try_dispatch(&request);
    }

    fn dispatch(&self, request: Request) -> Result<CallOutcome, ClientError> {
        tracing::trace!(
            target: "cryptoipc::engine",
            task = ?request.basic_task,
            caller = %request.caller_proxy_id,
            args = request.args.len(),
            "request built"
        );
        let response = self
            .try_dispatch(&request)
            .unwrap_or_else(|e| fatal(FramingFault::new(format!("transport I/O error: {e}"))));
        tracing::trace!(
            target: "cryptoipc::engine",
            task = ?response.basic_task,
            detail = ?response.detail_task,
            args = response.args.len(),
            "response decoded"
        );
        if response.is_success() {
            Ok(CallOutcome { args: response.args })
        } else {
            let kind = response
                .detail_task
                .domain_error()
                .expect("non-success response has a domain error by construction");
            tracing::debug!(target: "cryptoipc::engine", task = ?request.basic_task, ?kind, "domain error dispatched");
            Err(ClientError(kind))
        }
    }

    fn try_dispatch(&self, request: &Request) -> std::io::Result<Response> {
        self.channel.with_critical_section(|buf| {
            serialize_request(buf, request);
            tracing::trace!(target: "cryptoipc::engine", bytes = buf.len(), "request sent");
            let reply = self.channel.transceive(buf)?;
            tracing::trace!(target: "cryptoipc::engine", bytes = reply.len(), "response received");
            Ok(deserialize_response(&reply))
        })
    }
}
