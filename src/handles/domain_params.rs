//! Domain parameters: an opaque, exportable blob (e.g. DH/DSA parameters),
//! structurally identical to [`crate::handles::key::Key`] but a distinct
//! [`crate::ObjectKind`].

use crate::capability::{Identifiable, Keyed, Serializable};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct DomainParameters {
    core: HandleCore,
}

impl DomainParameters {
    pub fn create(provider: &Provider, algorithm: u32) -> Result<DomainParameters, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::DomainParameters,
            BasicTask::DomainParametersCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm)],
        )?
        .with_provider(provider);
        Ok(DomainParameters { core })
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for DomainParameters {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for DomainParameters {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

impl Serializable for DomainParameters {
    fn export(&self) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::DomainParametersExport, vec![])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }
}
