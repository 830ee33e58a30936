//! Test tooling (A4): an in-process loopback [`Transport`] and a scripted
//! fake server, in the style of a `TestServer`/`TestClient` pair, but pinned
//! to exact decoded requests and responses instead of a real socket so
//! assertions never depend on thread scheduling.
//!
//! Exported from the crate root only under `#[cfg(test)]`-equivalent
//! visibility: every item here is `pub` so integration tests under
//! `tests/` can build their own [`Engine`], but none of it is meant for a
//! real client.

use std::sync::{Arc, Mutex};

use crate::codec::{deserialize_request, serialize_response};
use crate::config::ClientConfig;
use crate::engine::Engine;
use crate::message::{Request, Response};
use crate::transport::Transport;

/// A fake server: decodes each request and runs a scripted closure to
/// produce the response, without ever touching an actual socket.
pub struct ScriptedServer<F> {
    handler: F,
}

impl<F> ScriptedServer<F>
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    pub fn new(handler: F) -> ScriptedServer<F> {
        ScriptedServer { handler }
    }
}

impl<F> Transport for ScriptedServer<F>
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn raw_send_and_receive(&self, request: &[u8]) -> std::io::Result<Vec<u8>> {
        let decoded = deserialize_request(request);
        let response = (self.handler)(&decoded);
        let mut buf = Vec::new();
        serialize_response(&mut buf, &response);
        Ok(buf)
    }
}

/// Wraps another transport and records every decoded request that passes
/// through it, so a test can assert on exactly what the engine sent — e.g.
/// that a successful factory call is followed by exactly one destroy
/// message, and a failed one by none.
pub struct RecordingTransport<T> {
    inner: T,
    sent: Arc<Mutex<Vec<Request>>>,
}

impl<T: Transport> RecordingTransport<T> {
    pub fn wrap(inner: T) -> RecordingTransport<T> {
        RecordingTransport {
            inner,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent_requests(&self) -> Arc<Mutex<Vec<Request>>> {
        self.sent.clone()
    }
}

impl<T: Transport> Transport for RecordingTransport<T> {
    fn raw_send_and_receive(&self, request: &[u8]) -> std::io::Result<Vec<u8>> {
        self.sent.lock().unwrap().push(deserialize_request(request));
        self.inner.raw_send_and_receive(request)
    }
}

/// A transport that always fails, standing in for a session whose endpoint
/// has already gone away.
pub struct FailingTransport;

impl Transport for FailingTransport {
    fn raw_send_and_receive(&self, _request: &[u8]) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "transport endpoint is gone",
        ))
    }
}

/// Builds an [`Engine`] wired directly to `server` with default config.
pub fn loopback_engine<F>(server: ScriptedServer<F>) -> Arc<Engine>
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    init_test_tracing();
    Engine::new(Box::new(server), ClientConfig::new())
}

/// Installs a `tracing` subscriber printing to stderr so `error::fatal`'s log
/// line is visible under `cargo test -- --nocapture`. Idempotent: later
/// calls from other tests in the same process are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
