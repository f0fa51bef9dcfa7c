//! Test doubles shared by the CA tests.

use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, PKCS_ECDSA_P256_SHA256,
    PKCS_ECDSA_P521_SHA512, PublicKeyData, SignatureAlgorithm, SigningKey,
};

use super::CaCredential;
use super::template::CA_KEY_USAGES;

/// Seeded source that records how many bytes were drawn.
pub struct CountingRng {
    inner: StdRng,
    consumed: usize,
}

impl CountingRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            consumed: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.consumed += 4;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.consumed += 8;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.consumed += dest.len();
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.consumed += dest.len();
        self.inner.try_fill_bytes(dest)
    }
}

impl CryptoRng for CountingRng {}

/// Source whose every read fails.
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        panic!("FailingRng must only be read through try_fill_bytes")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("FailingRng must only be read through try_fill_bytes")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("FailingRng must only be read through try_fill_bytes")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source exhausted"))
    }
}

impl CryptoRng for FailingRng {}

/// Source that only ever yields zero bytes.
pub struct ZeroRng;

impl RngCore for ZeroRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        dest.fill(0);
        Ok(())
    }
}

impl CryptoRng for ZeroRng {}

/// CA key whose signer is unavailable, like a detached hardware token.
pub struct RefusingKey(pub KeyPair);

impl PublicKeyData for RefusingKey {
    fn der_bytes(&self) -> &[u8] {
        self.0.der_bytes()
    }

    fn algorithm(&self) -> &'static SignatureAlgorithm {
        PublicKeyData::algorithm(&self.0)
    }
}

impl SigningKey for RefusingKey {
    fn sign(&self, _msg: &[u8]) -> Result<Vec<u8>, rcgen::Error> {
        Err(rcgen::Error::RemoteKeyError)
    }
}

/// Self-signed certificate and its key, before wrapping in a credential.
pub struct TestCa {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: Vec<u8>,
    pub key_pair: KeyPair,
}

fn self_signed(common_name: &str, is_ca: bool, alg: &'static SignatureAlgorithm) -> TestCa {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    if is_ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = CA_KEY_USAGES.to_vec();
    }
    let key_pair = KeyPair::generate_for(alg).unwrap();
    let cert = params.self_signed(&key_pair).unwrap();
    TestCa {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
        cert_der: cert.der().to_vec(),
        key_pair,
    }
}

/// A P-521 root CA named `common_name`.
pub fn test_ca(common_name: &str) -> TestCa {
    self_signed(common_name, true, &PKCS_ECDSA_P521_SHA512)
}

/// A P-521 self-signed certificate without the CA basic constraint.
pub fn test_non_ca(common_name: &str) -> TestCa {
    self_signed(common_name, false, &PKCS_ECDSA_P521_SHA512)
}

/// A P-256 root CA, whose key cannot produce SHA-512 signatures.
pub fn test_p256_ca(common_name: &str) -> TestCa {
    self_signed(common_name, true, &PKCS_ECDSA_P256_SHA256)
}

impl TestCa {
    pub fn credential(self) -> CaCredential {
        CaCredential::from_der(self.cert_der.into(), self.key_pair).unwrap()
    }
}

/// Verifies `der` was signed by the P-521 key in `issuer_der`.
pub fn signature_verifies(der: &[u8], issuer_der: &[u8]) -> bool {
    use p521::ecdsa::signature::Verifier;
    use p521::ecdsa::{Signature, VerifyingKey};
    use x509_parser::parse_x509_certificate;

    let (_, cert) = parse_x509_certificate(der).unwrap();
    let (_, issuer) = parse_x509_certificate(issuer_der).unwrap();
    let verifying_key =
        VerifyingKey::from_sec1_bytes(&issuer.public_key().subject_public_key.data).unwrap();
    let Ok(signature) = Signature::from_der(&cert.signature_value.data) else {
        return false;
    };
    verifying_key
        .verify(cert.tbs_certificate.as_ref(), &signature)
        .is_ok()
}
