//! X.509 distinguished name: an opaque, exportable blob built from caller-
//! supplied RDN bytes, plus a human-readable rendering.
//!
//! The attribute encoding itself (RDN sequence, OID table, ...) belongs to
//! the server's X.509 stack; the client only carries the bytes it was given
//! to `create` and the bytes the server hands back from `to_string`.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct X509Dn {
    core: HandleCore,
}

impl X509Dn {
    /// `encoded_attributes` is caller-supplied, already-encoded RDN data;
    /// the client never interprets it, only forwards it. X.509 parsing is
    /// delegated entirely to the server.
    pub fn create(provider: &Provider, encoded_attributes: &[u8]) -> Result<X509Dn, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::X509Dn,
            BasicTask::X509DnCreate,
            provider.proxy_id(),
            vec![ArgValue::Bytes(encoded_attributes.to_vec())],
        )?
        .with_provider(provider);
        Ok(X509Dn { core })
    }

    /// The server's canonical string rendering of this name, e.g. for
    /// display or comparison.
    pub fn to_display_string(&self) -> Result<String, ClientError> {
        let outcome = self.core.invoke(BasicTask::X509DnToString, vec![])?;
        let bytes = outcome.expect_bytes(0);
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ClientError(crate::error::DomainErrorKind::UnexpectedValue))
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for X509Dn {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for X509Dn {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
