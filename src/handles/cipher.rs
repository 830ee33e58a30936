//! Cipher context: `Start`/`Update`/`Finish`, plus `Reset` to rewind the
//! state machine in place. The chunking loop over `Update` relies on
//! last-write-wins: only the final slice's reply is surfaced to the caller.

use crate::capability::{Identifiable, Keyed, ResetAble};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct CipherContext {
    core: HandleCore,
}

impl CipherContext {
    pub fn create(provider: &Provider, algorithm: u32) -> Result<CipherContext, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::CipherContext,
            BasicTask::CipherCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm)],
        )?
        .with_provider(provider);
        Ok(CipherContext { core })
    }

    pub fn start(&self, iv: &[u8]) -> Result<(), ClientError> {
        self.core.invoke(BasicTask::CipherStart, vec![ArgValue::Bytes(iv.to_vec())])?;
        Ok(())
    }

    /// The input region is this call's single oversized argument and is
    /// split across as many wire calls as it takes.
    pub fn update(&self, input: &[u8]) -> Result<Vec<u8>, ClientError> {
        let outcome = self
            .core
            .invoke_chunked(BasicTask::CipherUpdate, input, |slice| vec![ArgValue::Bytes(slice.to_vec())])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }

    pub fn finish(&self) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::CipherFinish, vec![])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for CipherContext {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for CipherContext {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

impl ResetAble for CipherContext {
    fn reset(&self) -> Result<(), ClientError> {
        self.core.invoke(BasicTask::CipherReset, vec![])?;
        Ok(())
    }
}
