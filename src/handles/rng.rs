//! RNG: stateless `Generate`.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Rng {
    core: HandleCore,
}

impl Rng {
    pub fn create(provider: &Provider, algorithm: u32) -> Result<Rng, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Rng,
            BasicTask::RngCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm)],
        )?
        .with_provider(provider);
        Ok(Rng { core })
    }

    pub fn generate(&self, len: u32) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::RngGenerate, vec![ArgValue::U32(len)])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Rng {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Rng {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}
