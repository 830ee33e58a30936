//! Certificate signing request: built over a subject [`X509Dn`] and the key
//! whose signature it carries, with a single `VerifySignature` check
//! returning a plain boolean.

use crate::capability::{Identifiable, Keyed};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::handles::key::Key;
use crate::handles::x509_dn::X509Dn;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct Csr {
    core: HandleCore,
}

impl Csr {
    pub fn create(provider: &Provider, subject: &X509Dn, key: &Key) -> Result<Csr, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::Csr,
            BasicTask::CsrCreate,
            provider.proxy_id(),
            vec![ArgValue::ProxyRef(subject.proxy_id()), ArgValue::ProxyRef(key.proxy_id())],
        )?
        .with_provider(provider);
        Ok(Csr { core })
    }

    /// Checks the request's self-signature against its embedded public key.
    pub fn verify_signature(&self) -> Result<bool, ClientError> {
        let outcome = self.core.invoke(BasicTask::CsrVerifySignature, vec![])?;
        Ok(outcome.expect_bool(0))
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for Csr {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for Csr {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{IdentifiablePointer, Response};
    use crate::provider_registry::ProviderRegistry;
    use crate::task::DetailTask;
    use crate::testutil::{loopback_engine, ScriptedServer};

    #[test]
    fn verify_signature_returns_the_servers_verdict() {
        let engine = loopback_engine(ScriptedServer::new(|req| match req.basic_task {
            BasicTask::CsrVerifySignature => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::Bool(true)],
            },
            _ => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
                    *req.new_ids.first().unwrap_or(&crate::ids::ProxyId::NONE),
                ))],
            },
        }));
        let mut registry = ProviderRegistry::new();
        let provider = registry.get_or_create(&engine, 1).unwrap();

        let subject = X509Dn::create(&provider, b"\x01CN\x0bexample.com").unwrap();
        let key = Key::import(&provider, 0x0010 /* ECDSA-P256 */, b"seed-material").unwrap();
        let csr = Csr::create(&provider, &subject, &key).unwrap();

        assert!(csr.verify_signature().unwrap());
    }
}
