//! Typed handle surface: one thin, stateless shim per primitive kind, each
//! storing nothing beyond a [`crate::handle::HandleCore`] and encoding only
//! its own task ids and argument positions.
//!
//! Every shim's constructor wires a fresh proxy id through the same
//! creation protocol; every method forwards to `HandleCore::invoke` or
//! `invoke_chunked`. None of them hold any state the engine doesn't already
//! track through the handle core.

pub mod cipher;
pub mod csr;
pub mod domain_params;
pub mod hash;
pub mod kdf;
pub mod key;
pub mod mac;
pub mod ocsp;
pub mod rng;
pub mod signer;
pub mod trusted_container;
pub mod verifier;
pub mod x509_cert;
pub mod x509_dn;

pub use cipher::CipherContext;
pub use csr::Csr;
pub use domain_params::DomainParameters;
pub use hash::HashContext;
pub use kdf::Kdf;
pub use key::{Key, KeyCapabilities};
pub use mac::Mac;
pub use ocsp::OcspResponse;
pub use rng::Rng;
pub use signer::Signer;
pub use trusted_container::TrustedContainer;
pub use verifier::Verifier;
pub use x509_cert::Certificate;
pub use x509_dn::X509Dn;
