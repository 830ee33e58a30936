//! OCSP response: parsed once from a server reply, then checked against a
//! certificate chain. A revoked certificate causes all descendants in the
//! known chain to be transitioned to `Revoked`.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::x509_cert::Certificate;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct OcspResponse {
    core: HandleCore,
}

impl OcspResponse {
    pub fn parse(provider: &Provider, der: &[u8]) -> Result<OcspResponse, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::OcspResponse,
            BasicTask::OcspResponseParse,
            provider.proxy_id(),
            vec![ArgValue::Bytes(der.to_vec())],
        )?
        .with_provider(provider);
        Ok(OcspResponse { core })
    }

    /// Checks `chain[0]` (the certificate the response is *about*) against
    /// this OCSP response. `chain` lists that certificate followed by its
    /// known descendants, root-to-leaf order irrelevant beyond "ancestor
    /// before descendant": if the checked certificate is revoked, the
    /// server's `StatusVec` reply marks it and every descendant `Revoked`,
    /// applied positionally the same way [`Certificate::verify_chain`]
    /// applies its chain-wide verdict. A non-revoked result leaves every
    /// cached status untouched.
    pub fn check_cert_status(&self, chain: &[&Certificate]) -> Result<bool, ClientError> {
        let ids = chain.iter().map(|c| c.proxy_id()).collect();
        let outcome = self
            .core
            .invoke(BasicTask::OcspCheckCertStatus, vec![ArgValue::ProxyRefVec(ids)])?;
        let revoked = outcome.expect_bool(0);
        if outcome.args.len() > 1 {
            let statuses = outcome.expect_status_vec(1);
            for (cert, status) in chain.iter().zip(statuses) {
                cert.set_status(*status);
            }
        }
        Ok(revoked)
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for OcspResponse {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for OcspResponse {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::message::{IdentifiablePointer, Response};
    use crate::provider_registry::ProviderRegistry;
    use crate::task::DetailTask;
    use crate::testutil::ScriptedServer;
    use crate::x509::Status;

    #[test]
    fn revoked_leaf_marks_leaf_and_descendants_revoked() {
        // Three-cert chain, OCSP marks the leaf revoked.
        let server = ScriptedServer::new(|req| match req.basic_task {
            BasicTask::OcspCheckCertStatus => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![
                    ArgValue::Bool(true),
                    ArgValue::StatusVec(vec![Status::Revoked, Status::Revoked]),
                ],
            },
            _ => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                    *req.new_ids.first().unwrap_or(&crate::ids::ProxyId::NONE),
                ))],
            },
        });
        let engine = Engine::new(Box::new(server), crate::config::ClientConfig::new());
        let mut registry = ProviderRegistry::new();
        let provider = registry.get_or_create(&engine, 1).unwrap();

        let leaf = Certificate::parse(&provider, b"leaf").unwrap();
        let descendant = Certificate::parse(&provider, b"descendant").unwrap();
        let ocsp = OcspResponse::parse(&provider, b"ocsp-response").unwrap();

        let revoked = ocsp.check_cert_status(&[&leaf, &descendant]).unwrap();
        assert!(revoked);
        assert_eq!(leaf.status(), Status::Revoked);
        assert_eq!(descendant.status(), Status::Revoked);
    }
}
