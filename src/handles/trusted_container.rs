//! Trusted container: the crate's one concrete "value return plus a vector-
//! of-handles out-parameter" call.

use crate::capability::{Identifiable, Keyed, Serializable};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::x509_cert::Certificate;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct TrustedContainer {
    core: HandleCore,
}

impl TrustedContainer {
    pub fn open(provider: &Provider, store_ref: &[u8]) -> Result<TrustedContainer, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::TrustedContainer,
            BasicTask::TrustedContainerOpen,
            provider.proxy_id(),
            vec![ArgValue::Bytes(store_ref.to_vec())],
        )?
        .with_provider(provider);
        Ok(TrustedContainer { core })
    }

    /// Pre-creates `MAX_PROXIES_PER_MSG` candidate [`Certificate`] handles,
    /// sends their ids, and confirms exactly the `k` the server used: the
    /// first `k` candidates, in order, are returned; the remaining `N − k`
    /// are dropped with `send_destroy_flag` still false, so they emit no
    /// destroy message.
    pub fn get_certificates(&self) -> Result<Vec<Certificate>, ClientError> {
        let engine = self.core.engine().clone();
        let max = engine.config().max_proxies_per_msg();
        let candidates: Vec<HandleCore> = (0..max)
            .map(|_| HandleCore::candidate(engine.clone(), ObjectKind::Certificate))
            .collect();
        let candidate_ids = candidates.iter().map(|c| c.proxy_id()).collect();

        let k = engine.call_vector_factory(
            BasicTask::TrustedContainerGetCertificates,
            self.core.proxy_id(),
            vec![],
            candidate_ids,
        )?;

        let mut certificates = Vec::with_capacity(k);
        for mut candidate in candidates {
            if certificates.len() < k {
                candidate.confirm();
                certificates.push(Certificate::from_core(candidate));
            }
            // the remaining N - k candidates drop here, silently.
        }
        Ok(certificates)
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for TrustedContainer {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for TrustedContainer {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

impl Serializable for TrustedContainer {
    fn export(&self) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::TrustedContainerExport, vec![])?;
        Ok(outcome.expect_bytes(0).to_vec())
    }
}
