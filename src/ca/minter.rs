//! Leaf certificate minting.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rcgen::{CertificateParams, Issuer, SigningKey};
use rustls::pki_types::CertificateDer;
use time::OffsetDateTime;
use tracing::{debug, error};

use super::credential::CaCredential;
use super::error::{CaError, CaResult};
use super::keygen::LeafKeyPair;
use super::leaf::{CertificateInfo, LeafCertificate};
use super::template;
use crate::config::{MinterConfig, SerialPolicy};

/// Signs fresh leaf certificates with a CA credential.
///
/// Holds no state besides its policy: every call generates a new key
/// pair and returns a leaf the caller owns.
#[derive(Debug, Clone, Default)]
pub struct LeafMinter {
    serial: SerialPolicy,
}

impl LeafMinter {
    pub fn new(config: &MinterConfig) -> Self {
        Self {
            serial: config.serial,
        }
    }

    pub fn serial_policy(&self) -> SerialPolicy {
        self.serial
    }

    /// Mints a leaf for `names` using the OS random source.
    ///
    /// The first name becomes the subject common name and all names are
    /// listed, in order, as DNS subject alternative names.
    pub fn mint<S: AsRef<str>>(&self, ca: &CaCredential, names: &[S]) -> CaResult<LeafCertificate> {
        self.mint_with_rng(ca, names, &mut OsRng)
    }

    /// Mints a leaf drawing key and serial material from `rng`.
    pub fn mint_with_rng<S, R>(
        &self,
        ca: &CaCredential,
        names: &[S],
        rng: &mut R,
    ) -> CaResult<LeafCertificate>
    where
        S: AsRef<str>,
        R: RngCore + CryptoRng + ?Sized,
    {
        self.mint_at(ca, names, rng, OffsetDateTime::now_utc())
    }

    fn mint_at<S, R>(
        &self,
        ca: &CaCredential,
        names: &[S],
        rng: &mut R,
        now: OffsetDateTime,
    ) -> CaResult<LeafCertificate>
    where
        S: AsRef<str>,
        R: RngCore + CryptoRng + ?Sized,
    {
        ca.validate()?;

        let key = LeafKeyPair::generate(rng)?;
        let params = template::build(names, now, &self.serial, rng)?;

        let der = sign_leaf(&params, &key, ca.issuer())?;
        let info = read_back(&der)?;

        debug!(
            "minted leaf certificate for {:?} (serial {})",
            info.dns_names,
            hex(&info.serial)
        );

        Ok(LeafCertificate::new(der, info, key.into_pkcs8()))
    }
}

fn sign_leaf(
    params: &CertificateParams,
    key: &LeafKeyPair,
    issuer: &Issuer<'_, impl SigningKey>,
) -> CaResult<CertificateDer<'static>> {
    let cert = params.signed_by(key.key_pair(), issuer)?;
    Ok(CertificateDer::from(cert.der().to_vec()))
}

/// Parses freshly signed bytes. Failure here is a bug, not bad input.
fn read_back(der: &[u8]) -> CaResult<CertificateInfo> {
    CertificateInfo::parse(der).map_err(|e| {
        error!("signed leaf certificate does not parse: {}", e);
        CaError::MalformedOutput(e)
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
