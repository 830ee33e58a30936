//! Certificate: a `ProxyHandle` specialized with a cached [`Status`],
//! mutated only by the verification-category calls.

use std::cell::Cell;

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::x509::Status;
use crate::ObjectKind;

pub struct Certificate {
    core: HandleCore,
    status: Cell<Status>,
}

impl Certificate {
    pub fn parse(provider: &Provider, der: &[u8]) -> Result<Certificate, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Certificate,
            BasicTask::CertificateParse,
            provider.proxy_id(),
            vec![ArgValue::Bytes(der.to_vec())],
        )?
        .with_provider(provider);
        Ok(Certificate::from_core(core))
    }

    pub(crate) fn from_core(core: HandleCore) -> Certificate {
        Certificate {
            core,
            status: Cell::new(Status::Unknown),
        }
    }

    /// The last verdict observed from a verification call, `Unknown` until
    /// the first one. Never inferred locally.
    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// Updates only this certificate's status and never returns `Unknown`.
    pub fn verify_single(&self) -> Result<Status, ClientError> {
        let outcome = self.core.invoke(BasicTask::CertificateVerifySingle, vec![])?;
        let status = outcome.expect_status(0);
        self.status.set(status);
        Ok(status)
    }

    /// Re-fetches the cached status from the server rather than relying on
    /// the client-side cache (useful after another process-local handle to
    /// the same proxy id ran a verification call — the cache is purely
    /// local to this `Certificate` value).
    pub fn refresh_status(&self) -> Result<Status, ClientError> {
        let outcome = self.core.invoke(BasicTask::CertificateGetStatus, vec![])?;
        let status = outcome.expect_status(0);
        self.status.set(status);
        Ok(status)
    }

    /// Chain verification: `chain[0]` must be the root, each successor
    /// issued by its predecessor. An empty chain returns
    /// `Invalid` without mutating anything (nothing to mutate). On success
    /// or first failure the server's per-certificate `StatusVec` is applied
    /// positionally; on a structurally invalid chain the server returns no
    /// `StatusVec` and every cached status is left untouched.
    pub fn verify_chain(chain: &[Certificate]) -> Result<Status, ClientError> {
        if chain.is_empty() {
            return Ok(Status::Invalid);
        }
        let engine = chain[0].core.engine().clone();
        let ids = chain.iter().map(|c| c.core.proxy_id()).collect();
        let outcome = engine.call(
            BasicTask::CertificateVerifyChain,
            chain[0].core.proxy_id(),
            vec![ArgValue::ProxyRefVec(ids)],
        )?;
        let overall = outcome.expect_status(0);
        if outcome.args.len() > 1 {
            let statuses = outcome.expect_status_vec(1);
            for (cert, status) in chain.iter().zip(statuses) {
                cert.status.set(*status);
            }
        }
        Ok(overall)
    }

    pub fn release(self) {
        self.core.release();
    }

    /// Crate-private setter: the only way a `Status` is mutated from
    /// outside this module, used by [`crate::handles::ocsp::OcspResponse::check_cert_status`]
    /// to cascade a revocation verdict onto descendants in a chain.
    pub(crate) fn set_status(&self, status: Status) {
        self.status.set(status);
    }
}

impl Identifiable for Certificate {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Certificate {
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

    #[test]
    fn untrusted_root_marks_the_whole_chain_no_trust() {
        let server = ScriptedServer::new(|req| match req.basic_task {
            BasicTask::CertificateVerifyChain => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![
                    ArgValue::Status(Status::NoTrust),
                    ArgValue::StatusVec(vec![Status::NoTrust, Status::NoTrust, Status::NoTrust]),
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

        let root = Certificate::parse(&provider, b"root").unwrap();
        let intermediate = Certificate::parse(&provider, b"intermediate").unwrap();
        let leaf = Certificate::parse(&provider, b"leaf").unwrap();
        let chain = [root, intermediate, leaf];

        let result = Certificate::verify_chain(&chain).unwrap();
        assert_eq!(result, Status::NoTrust);
        for cert in &chain {
            assert_eq!(cert.status(), Status::NoTrust);
        }
    }

    #[test]
    fn empty_chain_is_invalid_and_mutates_nothing() {
        assert_eq!(Certificate::verify_chain(&[]).unwrap(), Status::Invalid);
    }
}
