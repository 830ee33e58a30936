//! Verifier: a single `Verify` call returning a plain boolean.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::key::Key;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Verifier {
    core: HandleCore,
}

impl Verifier {
    pub fn create(provider: &Provider, algorithm: u32, key: &Key) -> Result<Verifier, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Verifier,
            BasicTask::VerifierCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm), ArgValue::ProxyRef(key.proxy_id())],
        )?
        .with_provider(provider);
        Ok(Verifier { core })
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, ClientError> {
        let outcome = self.core.invoke(
            BasicTask::VerifierVerify,
            vec![ArgValue::Bytes(message.to_vec()), ArgValue::Bytes(signature.to_vec())],
        )?;
        Ok(outcome.expect_bool(0))
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Verifier {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Verifier {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
