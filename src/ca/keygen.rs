//! ECDSA P-521 key generation from a caller-supplied random source.

use p521::pkcs8::EncodePrivateKey;
use rand::{CryptoRng, RngCore};
use rcgen::{KeyPair, PKCS_ECDSA_P521_SHA512};
use rustls::pki_types::PrivatePkcs8KeyDer;

use super::error::{CaError, CaResult};

/// Size of a P-521 scalar in bytes.
const SCALAR_LEN: usize = 66;

/// Draws that land outside the scalar range are retried this many times.
const MAX_SCALAR_DRAWS: usize = 8;

/// A freshly generated leaf key pair.
pub struct LeafKeyPair {
    key_pair: KeyPair,
    pkcs8: PrivatePkcs8KeyDer<'static>,
}

impl LeafKeyPair {
    /// Generates a new P-521 key pair, reading all key material from `rng`.
    pub fn generate<R>(rng: &mut R) -> CaResult<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let secret = draw_scalar(rng)?;
        let document = secret
            .to_pkcs8_der()
            .map_err(|e| CaError::KeyGeneration(format!("PKCS#8 encoding failed: {e}")))?;
        let pkcs8 = PrivatePkcs8KeyDer::from(document.as_bytes().to_vec());
        let key_pair = KeyPair::from_pkcs8_der_and_sign_algo(&pkcs8, &PKCS_ECDSA_P521_SHA512)
            .map_err(|e| CaError::KeyGeneration(e.to_string()))?;

        Ok(Self { key_pair, pkcs8 })
    }

    /// Returns the rcgen view of the key pair.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Returns the raw uncompressed public point.
    pub fn public_key_raw(&self) -> &[u8] {
        self.key_pair.public_key_raw()
    }

    pub(crate) fn into_pkcs8(self) -> PrivatePkcs8KeyDer<'static> {
        self.pkcs8
    }
}

fn draw_scalar<R>(rng: &mut R) -> CaResult<p521::SecretKey>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; SCALAR_LEN];
    for _ in 0..MAX_SCALAR_DRAWS {
        rng.try_fill_bytes(&mut bytes).map_err(CaError::Entropy)?;
        // 521 bits: only the lowest bit of the leading byte is significant.
        bytes[0] &= 0x01;
        if let Ok(secret) = p521::SecretKey::from_slice(&bytes) {
            bytes.fill(0);
            return Ok(secret);
        }
    }
    bytes.fill(0);
    Err(CaError::KeyGeneration(format!(
        "random source produced no valid P-521 scalar in {MAX_SCALAR_DRAWS} draws"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::testing::{CountingRng, FailingRng, ZeroRng};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Tests that a generated key uses the P-521 / SHA-512 algorithm
    /// and exposes an uncompressed public point (0x04 || X || Y).
    #[test]
    fn generates_p521_key() {
        let key = LeafKeyPair::generate(&mut rand::rngs::OsRng).unwrap();
        assert_eq!(key.key_pair().algorithm(), &PKCS_ECDSA_P521_SHA512);
        assert_eq!(key.public_key_raw().len(), 1 + 2 * SCALAR_LEN);
        assert_eq!(key.public_key_raw()[0], 0x04);
    }

    /// Tests that the key is derived only from the injected source:
    /// the same seed yields the same key, a different seed a different one.
    #[test]
    fn key_follows_injected_source() {
        let a = LeafKeyPair::generate(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = LeafKeyPair::generate(&mut StdRng::seed_from_u64(7)).unwrap();
        let c = LeafKeyPair::generate(&mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a.public_key_raw(), b.public_key_raw());
        assert_ne!(a.public_key_raw(), c.public_key_raw());
    }

    /// Tests that every call draws fresh material.
    #[test]
    fn each_call_consumes_entropy() {
        let mut rng = CountingRng::new(1);
        let first = LeafKeyPair::generate(&mut rng).unwrap();
        let consumed = rng.consumed();
        assert!(consumed >= SCALAR_LEN);
        let second = LeafKeyPair::generate(&mut rng).unwrap();
        assert!(rng.consumed() > consumed);
        assert_ne!(first.public_key_raw(), second.public_key_raw());
    }

    /// Tests that a failing source surfaces as an entropy error.
    #[test]
    fn failing_source_is_surfaced() {
        let err = LeafKeyPair::generate(&mut FailingRng).err().unwrap();
        assert!(matches!(err, CaError::Entropy(_)));
    }

    /// Tests that a source stuck at zero is rejected after bounded retries
    /// rather than looping forever.
    #[test]
    fn stuck_source_is_rejected() {
        let err = LeafKeyPair::generate(&mut ZeroRng).err().unwrap();
        assert!(matches!(err, CaError::KeyGeneration(_)));
    }

    /// Tests that the exported PKCS#8 document loads back as the same key.
    #[test]
    fn pkcs8_round_trips_through_rcgen() {
        let key = LeafKeyPair::generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let public = key.public_key_raw().to_vec();
        let pkcs8 = key.into_pkcs8();
        let reloaded =
            KeyPair::from_pkcs8_der_and_sign_algo(&pkcs8, &PKCS_ECDSA_P521_SHA512).unwrap();
        assert_eq!(reloaded.public_key_raw(), public.as_slice());
    }
}
