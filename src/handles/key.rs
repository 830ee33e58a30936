//! Key material handle: opaque to the client beyond its capability set and
//! an exportable blob. Identifiable, serializable, keyed.

use bitflags::bitflags;

use crate::capability::{Identifiable, Keyed, Serializable};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

bitflags! {
    /// Mirrors the server's capability bitmask for a key (what operations it
    /// may be used in); the client never inspects individual bits itself,
    /// only forwards the mask to whichever primitive asks for it.
    pub struct KeyCapabilities: u32 {
        const ENCRYPT = 0b0000_0001;
        const DECRYPT = 0b0000_0010;
        const SIGN    = 0b0000_0100;
        const VERIFY  = 0b0000_1000;
        const DERIVE  = 0b0001_0000;
        const EXPORT  = 0b0010_0000;
    }
}

pub struct Key {
    core: HandleCore,
}

impl Key {
    /// Imports raw key material under `algorithm`, as opposed to a key
    /// produced by [`crate::handles::kdf::Kdf::derive_key`] (that path
    /// confirms an already-allocated candidate instead of running its own
    /// create call).
    pub fn import(provider: &Provider, algorithm: u32, material: &[u8]) -> Result<Key, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Key,
            BasicTask::KeyCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm), ArgValue::Bytes(material.to_vec())],
        )?
        .with_provider(provider);
        Ok(Key { core })
    }

    pub(crate) fn from_core(core: HandleCore) -> Key {
        Key { core }
    }

    pub fn capabilities(&self) -> Result<KeyCapabilities, ClientError> {
        let outcome = self.core.invoke(BasicTask::KeyGetCapabilities, vec![])?;
        Ok(KeyCapabilities::from_bits_truncate(outcome.expect_u32(0)))
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Key {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Key {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

impl Serializable for Key {
    fn export(&self) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::KeyExport, vec![])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }
}
