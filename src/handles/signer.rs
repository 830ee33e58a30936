//! Signer: a single `Sign` call over a keyed context.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::key::Key;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Signer {
    core: HandleCore,
}

impl Signer {
    pub fn create(provider: &Provider, algorithm: u32, key: &Key) -> Result<Signer, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Signer,
            BasicTask::SignerCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm), ArgValue::ProxyRef(key.proxy_id())],
        )?
        .with_provider(provider);
        Ok(Signer { core })
    }

    /// The message to sign is this call's single oversized argument and is
    /// split across as many wire calls as it takes.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ClientError> {
        let outcome = self
            .core
            .invoke_chunked(BasicTask::SignerSign, message, |slice| vec![ArgValue::Bytes(slice.to_vec())])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Signer {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Signer {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
