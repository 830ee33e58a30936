//! Closed task-id vocabulary for the wire protocol. `BasicTask` names the
//! remote operation a request invokes; `DetailTask` is the response's
//! error channel (success marker or domain error code).
//!
//! The full production catalog has dozens of primitive interfaces; this
//! core picks one representative operation family per [`crate::ObjectKind`]
//! so the generic engine has concrete call sites to route, without trying to
//! re-enumerate a production crypto API that belongs to the server.

use crate::error::DomainErrorKind;

macro_rules! basic_task {
    ($( $variant:ident = $code:expr ),+ $(,)?) => {
        /// Wire-level operation id, the `BasicTask` field of the message layout.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BasicTask {
            $( $variant ),+
        }

        impl BasicTask {
            pub const fn wire_code(self) -> u32 {
                match self {
                    $( BasicTask::$variant => $code ),+
                }
            }

            pub fn from_wire_code(code: u32) -> Option<BasicTask> {
                match code {
                    $( $code => Some(BasicTask::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

basic_task! {
    DestroyProxy = 0,

    ProviderCreateFromUid = 1,
    ProviderGetName = 2,

    HashCreate = 10,
    HashStart = 11,
    HashUpdate = 12,
    HashFinish = 13,
    HashGetDigest = 14,

    CipherCreate = 20,
    CipherStart = 21,
    CipherUpdate = 22,
    CipherFinish = 23,
    CipherReset = 24,

    MacCreate = 30,
    MacStart = 31,
    MacUpdate = 32,
    MacFinish = 33,

    SignerCreate = 40,
    SignerSign = 41,

    VerifierCreate = 50,
    VerifierVerify = 51,

    KdfCreate = 60,
    KdfDeriveKey = 61,

    RngCreate = 70,
    RngGenerate = 71,

    KeyCreate = 78,
    KeyGetCapabilities = 80,
    KeyExport = 81,

    DomainParametersCreate = 90,
    DomainParametersExport = 91,

    TrustedContainerOpen = 100,
    TrustedContainerGetCertificates = 101,
    TrustedContainerExport = 102,

    CertificateParse = 110,
    CertificateVerifySingle = 111,
    CertificateVerifyChain = 112,
    CertificateGetStatus = 113,

    CsrCreate = 120,
    CsrVerifySignature = 121,

    X509DnCreate = 130,
    X509DnToString = 131,

    OcspResponseParse = 140,
    OcspCheckCertStatus = 141,
}

/// Response error channel, the `DetailTask` field of the message layout.
/// `0` means the call succeeded; any other value is the wire code of one of
/// the closed [`DomainErrorKind`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTask(u32);

impl DetailTask {
    pub const SUCCESS: DetailTask = DetailTask(0);

    pub const fn from_wire_code(code: u32) -> DetailTask {
        DetailTask(code)
    }

    pub const fn wire_code(self) -> u32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// `None` if this is the success marker; otherwise the decoded domain
    /// error kind, or a framing fault if the code is outside the closed set
    /// (a code the client's codec does not know about indicates a
    /// protocol-version mismatch between client and server).
    pub fn domain_error(self) -> Option<DomainErrorKind> {
        if self.is_success() {
            None
        } else {
            Some(DomainErrorKind::from_wire_code(self.0).unwrap_or_else(|| {
                crate::error::fatal(crate::error::FramingFault::new(format!(
                    "detail task {} is not a known domain error code",
                    self.0
                )))
            }))
        }
    }
}

impl From<DomainErrorKind> for DetailTask {
    fn from(kind: DomainErrorKind) -> DetailTask {
        DetailTask(kind.wire_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_task_round_trips_through_wire_code() {
        assert_eq!(
            BasicTask::from_wire_code(BasicTask::HashUpdate.wire_code()),
            Some(BasicTask::HashUpdate)
        );
        assert_eq!(BasicTask::from_wire_code(u32::MAX), None);
    }

    #[test]
    fn detail_task_success_has_no_domain_error() {
        assert!(DetailTask::SUCCESS.domain_error().is_none());
        let err = DetailTask::from(DomainErrorKind::UnknownIdentifier);
        assert_eq!(err.domain_error(), Some(DomainErrorKind::UnknownIdentifier));
    }
}
