//! KDF: `DeriveKey` is a factory call made *on* an existing handle rather
//! than on a provider, but otherwise follows the same creation protocol.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::key::Key;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Kdf {
    core: HandleCore,
}

impl Kdf {
    pub fn create(provider: &Provider, algorithm: u32) -> Result<Kdf, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Kdf,
            BasicTask::KdfCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm)],
        )?
        .with_provider(provider);
        Ok(Kdf { core })
    }

    /// Derives a new key, with `self` as the caller proxy rather than a
    /// provider. The derived key still belongs to `provider` and carries a
    /// back-reference to it, exactly like a key produced by
    /// [`crate::handles::key::Key::import`].
    pub fn derive_key(&self, provider: &Provider, info: &[u8], output_len: u32) -> Result<Key, ClientError> {
        let derived = HandleCore::create_for_caller(
            self.core.engine().clone(),
            ObjectKind::Key,
            BasicTask::KdfDeriveKey,
            self.core.proxy_id(),
            vec![ArgValue::Bytes(info.to_vec()), ArgValue::U32(output_len)],
        )?
        .with_provider(provider);
        Ok(Key::from_core(derived))
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Kdf {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Kdf {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
