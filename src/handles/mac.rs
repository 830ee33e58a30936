//! MAC context: keyed `Start`/`Update`/`Finish`.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::key::Key;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Mac {
    core: HandleCore,
}

impl Mac {
    pub fn create(provider: &Provider, algorithm: u32, key: &Key) -> Result<Mac, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Mac,
            BasicTask::MacCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm), ArgValue::ProxyRef(key.proxy_id())],
        )?
        .with_provider(provider);
        Ok(Mac { core })
    }

    pub fn start(&self) -> Result<(), ClientError> {
        self.core.invoke(BasicTask::MacStart, vec![])?;
        Ok(())
    }

    pub fn update(&self, data: &[u8]) -> Result<(), ClientError> {
        self.core
            .invoke_chunked(BasicTask::MacUpdate, data, |slice| vec![ArgValue::Bytes(slice.to_vec())])?;
        Ok(())
    }

    pub fn finish(&self) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::MacFinish, vec![])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Mac {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Mac {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
