//! Minted leaf certificates and their parsed view.

use rcgen::KeyUsagePurpose;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::sign::CertifiedKey;
use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::parse_x509_certificate;
use x509_parser::x509::X509Name;

use super::error::{CaError, CaResult};

/// OID of ecdsa-with-SHA512.
pub const ECDSA_WITH_SHA512_OID: &str = "1.2.840.10045.4.3.4";

/// Fields read back from a signed certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject: String,
    pub subject_common_name: Option<String>,
    pub issuer: String,
    pub issuer_common_name: Option<String>,
    /// Big-endian serial, as encoded.
    pub serial: Vec<u8>,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    /// DNS names from the SAN extension, in certificate order.
    pub dns_names: Vec<String>,
    pub is_ca: bool,
    /// True when the basic constraints extension is present.
    pub basic_constraints_valid: bool,
    pub key_usages: Vec<KeyUsagePurpose>,
    /// Dotted OID of the signature algorithm.
    pub signature_algorithm: String,
    /// Raw subject public key bits.
    pub public_key: Vec<u8>,
}

impl CertificateInfo {
    /// Parses a DER certificate.
    pub fn parse(der: &[u8]) -> Result<Self, String> {
        let (rest, cert) = parse_x509_certificate(der).map_err(|e| e.to_string())?;
        if !rest.is_empty() {
            return Err(format!("{} trailing bytes after certificate", rest.len()));
        }
        Self::from_x509(&cert)
    }

    fn from_x509(cert: &X509Certificate<'_>) -> Result<Self, String> {
        let basic_constraints = cert.basic_constraints().map_err(|e| e.to_string())?;
        let dns_names = match cert.subject_alternative_name().map_err(|e| e.to_string())? {
            Some(san) => san
                .value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some(dns.to_string()),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        };
        let key_usages = match cert.key_usage().map_err(|e| e.to_string())? {
            Some(ku) => {
                let ku = ku.value;
                [
                    (ku.digital_signature(), KeyUsagePurpose::DigitalSignature),
                    (ku.non_repudiation(), KeyUsagePurpose::ContentCommitment),
                    (ku.key_encipherment(), KeyUsagePurpose::KeyEncipherment),
                    (ku.data_encipherment(), KeyUsagePurpose::DataEncipherment),
                    (ku.key_agreement(), KeyUsagePurpose::KeyAgreement),
                    (ku.key_cert_sign(), KeyUsagePurpose::KeyCertSign),
                    (ku.crl_sign(), KeyUsagePurpose::CrlSign),
                    (ku.encipher_only(), KeyUsagePurpose::EncipherOnly),
                    (ku.decipher_only(), KeyUsagePurpose::DecipherOnly),
                ]
                .into_iter()
                .filter_map(|(set, usage)| set.then_some(usage))
                .collect()
            }
            None => Vec::new(),
        };

        Ok(Self {
            subject: cert.subject().to_string(),
            subject_common_name: common_name(cert.subject()),
            issuer: cert.issuer().to_string(),
            issuer_common_name: common_name(cert.issuer()),
            serial: cert.raw_serial().to_vec(),
            not_before: cert.validity().not_before.to_datetime(),
            not_after: cert.validity().not_after.to_datetime(),
            dns_names,
            is_ca: basic_constraints.as_ref().is_some_and(|bc| bc.value.ca),
            basic_constraints_valid: basic_constraints.is_some(),
            key_usages,
            signature_algorithm: cert.signature_algorithm.algorithm.to_id_string(),
            public_key: cert.public_key().subject_public_key.data.to_vec(),
        })
    }

    /// Returns true if `at` falls inside the validity window.
    pub fn is_valid_at(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// Returns the first common name of `name`, if any.
pub(crate) fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_owned)
}

/// A leaf certificate signed by a [`CaCredential`](super::CaCredential).
pub struct LeafCertificate {
    der: CertificateDer<'static>,
    info: CertificateInfo,
    key: PrivatePkcs8KeyDer<'static>,
}

impl LeafCertificate {
    pub(crate) fn new(
        der: CertificateDer<'static>,
        info: CertificateInfo,
        key: PrivatePkcs8KeyDer<'static>,
    ) -> Self {
        Self { der, info, key }
    }

    /// Returns the certificate in DER format.
    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    pub fn info(&self) -> &CertificateInfo {
        &self.info
    }

    /// Returns the leaf private key (PKCS#8).
    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(self.key.clone_key())
    }

    /// Returns the certificate in PEM format.
    pub fn cert_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der.to_vec()))
    }

    /// Returns the private key in PEM format.
    pub fn key_pem(&self) -> String {
        pem::encode(&pem::Pem::new(
            "PRIVATE KEY",
            self.key.secret_pkcs8_der().to_vec(),
        ))
    }

    /// Builds a rustls server identity from the leaf.
    pub fn certified_key(&self) -> CaResult<CertifiedKey> {
        let signing_key = rustls::crypto::aws_lc_rs::sign::any_supported_type(&self.private_key())
            .map_err(CaError::SigningKey)?;
        Ok(CertifiedKey::new(vec![self.der.clone()], signing_key))
    }

    /// Splits the leaf into certificate, parsed view and key.
    pub fn into_parts(
        self,
    ) -> (
        CertificateDer<'static>,
        CertificateInfo,
        PrivateKeyDer<'static>,
    ) {
        (self.der, self.info, PrivateKeyDer::Pkcs8(self.key))
    }
}

impl std::fmt::Debug for LeafCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafCertificate")
            .field("subject", &self.info.subject)
            .field("dns_names", &self.info.dns_names)
            .field("not_after", &self.info.not_after)
            .finish_non_exhaustive()
    }
}
