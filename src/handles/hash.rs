//! Hash context: `Start`/`Update`/`Finish`/`GetDigest` state machine.

use crate::capability::{Identifiable, Keyed, ResetAble};
use crate::error::ClientError;
use crate::handle::HandleCore;
use crate::ids::ProxyId;
use crate::message::ArgValue;
use crate::provider_registry::Provider;
use crate::task::BasicTask;
use crate::ObjectKind;

pub struct HashContext {
    core: HandleCore,
}

impl HashContext {
    pub fn create(provider: &Provider, algorithm: u32) -> Result<HashContext, ClientError> {
        let core = HandleCore::create_for_caller(
            provider.core().engine().clone(),
            ObjectKind::HashContext,
            BasicTask::HashCreate,
            provider.proxy_id(),
            vec![ArgValue::U32(algorithm)],
        )?
        .with_provider(provider);
        Ok(HashContext { core })
    }

    pub fn start(&self) -> Result<(), ClientError> {
        self.core.invoke(BasicTask::HashStart, vec![])?;
        Ok(())
    }

    pub fn update(&self, data: &[u8]) -> Result<(), ClientError> {
        self.core
            .invoke_chunked(BasicTask::HashUpdate, data, |slice| vec![ArgValue::Bytes(slice.to_vec())])?;
        Ok(())
    }

    pub fn finish(&self) -> Result<(), ClientError> {
        self.core.invoke(BasicTask::HashFinish, vec![])?;
        Ok(())
    }

    /// Writes up to `capacity` bytes of the digest and returns exactly the
    /// bytes written.
    pub fn get_digest(&self, capacity: u32) -> Result<Vec<u8>, ClientError> {
        let outcome = self.core.invoke(BasicTask::HashGetDigest, vec![ArgValue::U32(capacity)])?;
        let len = outcome.expect_u32(0) as usize;
        let bytes = outcome.expect_bytes(1);
        if len > bytes.len() {
            crate::error::fatal(crate::error::FramingFault::new(format!(
                "digest reported {len} bytes but the response only carried {}",
                bytes.len()
            )));
        }
        Ok(bytes[..len].to_vec())
    }

    pub fn release(self) {
        self.core.release();
    }
}

impl Identifiable for HashContext {
    fn proxy_id(&self) -> ProxyId {
        self.core.proxy_id()
    }
}

impl Keyed for HashContext {
    fn provider_uid(&self) -> Option<u64> {
        self.core.provider_uid()
    }
}

impl ResetAble for HashContext {
    fn reset(&self) -> Result<(), ClientError> {
        self.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{IdentifiablePointer, Response};
    use crate::provider_registry::ProviderRegistry;
    use crate::task::DetailTask;
    use crate::testutil::{loopback_engine, ScriptedServer};

    // SHA-256("abc").
    const ABC_SHA256: [u8; 32] = [
        0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, 0xb0, 0x03,
        0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
    ];

    #[test]
    fn hash_round_trip_returns_the_expected_digest() {
        let engine = loopback_engine(ScriptedServer::new(move |req| match req.basic_task {
            BasicTask::HashGetDigest => Response {
                basic_task: req.basic_task,
                detail_task: DetailTask::SUCCESS,
                args: vec![ArgValue::U32(32), ArgValue::Bytes(ABC_SHA256.to_vec())],
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

        let ctx = HashContext::create(&provider, 0x0001 /* SHA-256 */).unwrap();
        ctx.start().unwrap();
        ctx.update(b"abc").unwrap();
        ctx.finish().unwrap();
        let digest = ctx.get_digest(32).unwrap();

        assert_eq!(digest, ABC_SHA256.to_vec());
    }
}
