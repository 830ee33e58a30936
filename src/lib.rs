//! Client-side proxy runtime and IPC protocol for a process-isolated
//! cryptographic service: an untrusted client process consumes a remote
//! cryptography API (ciphers, hashes, MACs, signers, key derivation, RNG,
//! X.509 and OCSP) while a privileged server process holds the key material
//! and performs the actual primitives.
//!
//! This crate is the **core**: request/response framing ([`codec`]), proxy
//! identity ([`ids`]), remote-handle lifecycle ([`handle`]), out-parameter
//! write-back and oversized-payload chunking ([`chunking`]), thread-safe
//! transport multiplexing ([`transport`]), and the X.509 verification state
//! contract ([`x509`]). The server side and the concrete crypto primitives
//! are out of scope; [`testutil`] stands in for a real server in tests.

pub mod capability;
pub mod chunking;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod handles;
pub mod ids;
pub mod message;
pub mod provider_registry;
pub mod task;
pub mod testutil;
pub mod transport;
pub mod x509;

pub use config::ClientConfig;
pub use engine::{CallOutcome, Engine};
pub use error::{ClientError, DomainErrorKind};
pub use ids::ProxyId;
pub use message::ArgValue;
pub use provider_registry::{Provider, ProviderRegistry};
pub use transport::Transport;
pub use x509::Status;

/// Closed set of remote primitive kinds a [`handle::HandleCore`] can stand
/// in for. The production service has a far richer interface catalog than
/// this core re-implements; each variant here corresponds to one
/// representative family of [`task::BasicTask`]s in [`handles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Provider,
    HashContext,
    CipherContext,
    Mac,
    Signer,
    Verifier,
    Kdf,
    Rng,
    Key,
    DomainParameters,
    TrustedContainer,
    Certificate,
    Csr,
    X509Dn,
    OcspResponse,
}
