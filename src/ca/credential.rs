//! CA certificate and key pair used to sign leaves.

use rcgen::{Issuer, KeyPair, PKCS_ECDSA_P521_SHA512, SignatureAlgorithm};
use rustls::pki_types::CertificateDer;
use tracing::debug;
use x509_parser::parse_x509_certificate;
use x509_parser::pem::parse_x509_pem;

use super::error::{CaError, CaResult};
use super::leaf::common_name;

/// A loaded CA certificate and its private key.
///
/// The credential is only read while minting, so one instance can be
/// shared between threads.
pub struct CaCredential {
    issuer: Issuer<'static, KeyPair>,
    cert_der: CertificateDer<'static>,
    /// The subject DN, e.g. `CN=Test Root`.
    subject: String,
    subject_common_name: Option<String>,
    is_ca: bool,
    key_matches: bool,
    algorithm: &'static SignatureAlgorithm,
}

impl CaCredential {
    /// Wraps a DER certificate and its key pair.
    ///
    /// This only fails when the certificate cannot be parsed at all;
    /// whether it is usable as a CA is checked by [`CaCredential::validate`].
    pub fn from_der(cert_der: CertificateDer<'static>, key_pair: KeyPair) -> CaResult<Self> {
        let (_, cert) = parse_x509_certificate(&cert_der)
            .map_err(|e| CaError::InvalidCa(format!("failed to parse CA certificate: {e}")))?;

        let subject = cert.subject().to_string();
        let subject_common_name = common_name(cert.subject());
        let is_ca = cert.is_ca();
        let key_matches = cert.public_key().subject_public_key.data.as_ref()
            == key_pair.public_key_raw();
        let algorithm = key_pair.algorithm();

        let issuer = Issuer::from_ca_cert_der(&cert_der, key_pair)
            .map_err(|e| CaError::InvalidCa(format!("failed to read CA issuer fields: {e}")))?;

        debug!("loaded CA credential {} (is_ca: {})", subject, is_ca);

        Ok(Self {
            issuer,
            cert_der,
            subject,
            subject_common_name,
            is_ca,
            key_matches,
            algorithm,
        })
    }

    /// Parses a PEM certificate and PEM private key.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> CaResult<Self> {
        let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
            .map_err(|e| CaError::InvalidCa(format!("failed to read CA certificate PEM: {e}")))?;
        if pem.label != "CERTIFICATE" {
            return Err(CaError::InvalidCa(format!(
                "expected CERTIFICATE block, got {}",
                pem.label
            )));
        }
        let key_pair = KeyPair::from_pem(key_pem)
            .map_err(|e| CaError::InvalidCa(format!("failed to read CA private key: {e}")))?;

        Self::from_der(CertificateDer::from(pem.contents), key_pair)
    }

    /// Checks that the credential can issue certificates.
    ///
    /// Leaves are always signed with ECDSA P-521 and SHA-512, so a CA key
    /// of any other algorithm is refused here.
    pub fn validate(&self) -> CaResult<()> {
        if !self.is_ca {
            return Err(CaError::InvalidCa(format!(
                "{} is not a CA certificate",
                self.subject
            )));
        }
        if !self.key_matches {
            return Err(CaError::InvalidCa(format!(
                "private key does not match {}",
                self.subject
            )));
        }
        if self.algorithm != &PKCS_ECDSA_P521_SHA512 {
            return Err(CaError::AlgorithmMismatch {
                found: format!("{:?}", self.algorithm),
                expected: "ECDSA P-521 with SHA-512",
            });
        }
        Ok(())
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn subject_common_name(&self) -> Option<&str> {
        self.subject_common_name.as_deref()
    }

    /// Returns the CA certificate in DER format.
    pub fn cert_der(&self) -> &CertificateDer<'static> {
        &self.cert_der
    }

    /// Returns the signature algorithm of the CA key.
    pub fn algorithm(&self) -> &'static SignatureAlgorithm {
        self.algorithm
    }

    pub(crate) fn issuer(&self) -> &Issuer<'static, KeyPair> {
        &self.issuer
    }
}

impl std::fmt::Debug for CaCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaCredential")
            .field("subject", &self.subject)
            .field("is_ca", &self.is_ca)
            .finish_non_exhaustive()
    }
}
