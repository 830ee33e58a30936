//! Integration-style, end-to-end scenarios, each driven through the
//! public API exactly as a host application would use it: obtain a
//! provider, create handles, call methods. A scripted peer plus assertions
//! on the resulting client-side state, against the in-crate loopback
//! instead of a real socket (see `src/testutil.rs`).

use cryptoipc::capability::Identifiable;
use cryptoipc::handles::{Certificate, CipherContext, HashContext, OcspResponse};
use cryptoipc::message::{ArgValue, IdentifiablePointer};
use cryptoipc::task::{BasicTask, DetailTask};
use cryptoipc::testutil::{RecordingTransport, ScriptedServer};
use cryptoipc::{ClientConfig, DomainErrorKind, Engine, ProviderRegistry, Status};

fn confirm_any_creation(req: &cryptoipc::message::Request) -> cryptoipc::message::Response {
    cryptoipc::message::Response {
        basic_task: req.basic_task,
        detail_task: DetailTask::SUCCESS,
        args: vec![ArgValue::IdentifiablePointer(IdentifiablePointer::of(
            *req.new_ids.first().unwrap_or(&cryptoipc::ProxyId::NONE),
        ))],
    }
}

// SHA-256("abc").
const ABC_SHA256: [u8; 32] = [
    0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, 0xb0, 0x03, 0x61,
    0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
];

#[test]
fn hash_round_trip_through_the_public_handle_surface() {
    let server = ScriptedServer::new(move |req| match req.basic_task {
        BasicTask::HashGetDigest => cryptoipc::message::Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::U32(32), ArgValue::Bytes(ABC_SHA256.to_vec())],
        },
        _ => confirm_any_creation(req),
    });
    let engine = Engine::new(Box::new(server), ClientConfig::new());
    let mut registry = ProviderRegistry::new();
    let provider = registry.get_or_create(&engine, 1).unwrap();

    let ctx = HashContext::create(&provider, 0x0001 /* SHA-256 */).unwrap();
    ctx.start().unwrap();
    ctx.update(b"abc").unwrap();
    ctx.finish().unwrap();
    assert_eq!(ctx.get_digest(32).unwrap(), ABC_SHA256.to_vec());
}

#[test]
fn create_then_fail_factory_sends_no_destroy_for_the_candidate() {
    // Unknown algorithm id on a cipher create.
    let transport = RecordingTransport::wrap(ScriptedServer::new(|req| match req.basic_task {
        BasicTask::CipherCreate => cryptoipc::message::Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::from(DomainErrorKind::UnknownIdentifier),
            args: vec![],
        },
        _ => confirm_any_creation(req),
    }));
    let sent = transport.sent_requests();
    let engine = Engine::new(Box::new(transport), ClientConfig::new());
    let mut registry = ProviderRegistry::new();
    let provider = registry.get_or_create(&engine, 1).unwrap();
    sent.lock().unwrap().clear();

    let err = CipherContext::create(&provider, 0xDEADBEEF).unwrap_err();
    assert_eq!(err.kind(), DomainErrorKind::UnknownIdentifier);

    let requests = sent.lock().unwrap();
    assert_eq!(requests.len(), 1, "only the failed create call, no destroy");
    assert!(requests.iter().all(|r| r.basic_task != BasicTask::DestroyProxy));
}

#[test]
fn oversized_update_is_chunked_into_requests_of_the_expected_sizes() {
    // region.len = 3 * max_request_size + 17.
    let max_request_size: usize = 1024;
    let transport = RecordingTransport::wrap(ScriptedServer::new(|req| match req.basic_task {
        BasicTask::HashUpdate => cryptoipc::message::Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![],
        },
        _ => confirm_any_creation(req),
    }));
    let sent = transport.sent_requests();
    let engine = Engine::new(
        Box::new(transport),
        ClientConfig::new().with_max_request_size(max_request_size),
    );
    let mut registry = ProviderRegistry::new();
    let provider = registry.get_or_create(&engine, 1).unwrap();
    let ctx = HashContext::create(&provider, 0x0001).unwrap();
    sent.lock().unwrap().clear();

    // Pick a region whose length is exactly 3 whole budgets plus a
    // remainder, where "budget" already accounts for this call's fixed
    // per-message overhead, without assuming the overhead is zero.
    let (_, per_msg_overhead) = cryptoipc::codec::predict_size(
        BasicTask::HashUpdate,
        ctx.proxy_id(),
        &[ArgValue::Bytes(vec![])],
    );
    let budget = max_request_size - per_msg_overhead;
    let region = vec![0x42u8; 3 * budget + 17];
    ctx.update(&region).unwrap();

    let requests = sent.lock().unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| match &r.args[0] {
            ArgValue::Bytes(b) => b.len(),
            other => panic!("expected a Bytes argument, got {other:?}"),
        })
        .collect();
    assert_eq!(sizes, vec![budget, budget, budget, 17]);
    assert_eq!(sizes.iter().sum::<usize>(), region.len());
}

#[test]
fn chain_verification_with_untrusted_root_marks_every_certificate() {
    let server = ScriptedServer::new(|req| match req.basic_task {
        BasicTask::CertificateVerifyChain => cryptoipc::message::Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![
                ArgValue::Status(Status::NoTrust),
                ArgValue::StatusVec(vec![Status::NoTrust, Status::NoTrust, Status::NoTrust]),
            ],
        },
        _ => confirm_any_creation(req),
    });
    let engine = Engine::new(Box::new(server), ClientConfig::new());
    let mut registry = ProviderRegistry::new();
    let provider = registry.get_or_create(&engine, 1).unwrap();

    let chain = [
        Certificate::parse(&provider, b"root").unwrap(),
        Certificate::parse(&provider, b"intermediate").unwrap(),
        Certificate::parse(&provider, b"leaf").unwrap(),
    ];
    let overall = Certificate::verify_chain(&chain).unwrap();

    assert_eq!(overall, Status::NoTrust);
    assert!(chain.iter().all(|c| c.status() == Status::NoTrust));
}

#[test]
fn revoked_leaf_cascades_through_ocsp() {
    let server = ScriptedServer::new(|req| match req.basic_task {
        BasicTask::OcspCheckCertStatus => cryptoipc::message::Response {
            basic_task: req.basic_task,
            detail_task: DetailTask::SUCCESS,
            args: vec![ArgValue::Bool(true), ArgValue::StatusVec(vec![Status::Revoked])],
        },
        _ => confirm_any_creation(req),
    });
    let engine = Engine::new(Box::new(server), ClientConfig::new());
    let mut registry = ProviderRegistry::new();
    let provider = registry.get_or_create(&engine, 1).unwrap();

    let leaf = Certificate::parse(&provider, b"leaf").unwrap();
    let ocsp = OcspResponse::parse(&provider, b"ocsp-response").unwrap();

    assert!(ocsp.check_cert_status(&[&leaf]).unwrap());
    assert_eq!(leaf.status(), Status::Revoked);
}

/// Serves every call normally until `cut_after` requests have gone through,
/// then behaves like the endpoint was closed -- for reproducing dropping a
/// live handle after the transport endpoint has been closed, without the
/// earlier, still-live creation call itself hitting the fatal I/O path.
struct CutAfter<F> {
    handler: F,
    remaining: std::sync::atomic::AtomicUsize,
}

impl<F: Fn(&cryptoipc::message::Request) -> cryptoipc::message::Response + Send + Sync>
    cryptoipc::Transport for CutAfter<F>
{
    fn raw_send_and_receive(&self, request: &[u8]) -> std::io::Result<Vec<u8>> {
        use std::sync::atomic::Ordering;
        if self.remaining.load(Ordering::SeqCst) == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "transport endpoint is gone"));
        }
        self.remaining.fetch_sub(1, Ordering::SeqCst);
        let decoded = cryptoipc::codec::deserialize_request(request);
        let response = (self.handler)(&decoded);
        let mut buf = Vec::new();
        cryptoipc::codec::serialize_response(&mut buf, &response);
        Ok(buf)
    }
}

#[test]
fn dropping_a_handle_after_the_transport_is_gone_does_not_abort_the_process() {
    let transport = CutAfter {
        handler: confirm_any_creation,
        remaining: std::sync::atomic::AtomicUsize::new(1),
    };
    let engine = Engine::new(Box::new(transport), ClientConfig::new());
    let mut registry = ProviderRegistry::new();

    let provider = registry.get_or_create(&engine, 1).unwrap();
    drop(provider);
    // The destroy message for the provider above hit the now-gone
    // transport and was swallowed; reaching this point without a process
    // abort is the assertion.
}
