//! Unsigned leaf certificate parameters.

use rand::{CryptoRng, RngCore};
use rcgen::{CertificateParams, DnType, IsCa, KeyUsagePurpose, SanType, SerialNumber};
use time::{Duration, OffsetDateTime};

use super::error::{CaError, CaResult, TemplateError};
use crate::config::SerialPolicy;

/// Lifetime of every minted leaf.
pub const LEAF_LIFETIME: Duration = Duration::hours(24);

/// Key usage bits of the issuing CA.
pub const CA_KEY_USAGES: [KeyUsagePurpose; 7] = [
    KeyUsagePurpose::DigitalSignature,
    KeyUsagePurpose::ContentCommitment,
    KeyUsagePurpose::KeyEncipherment,
    KeyUsagePurpose::DataEncipherment,
    KeyUsagePurpose::KeyAgreement,
    KeyUsagePurpose::KeyCertSign,
    KeyUsagePurpose::CrlSign,
];

/// Leaves mirror the CA profile so permissive validators see no usage mismatch.
pub const LEAF_KEY_USAGES: [KeyUsagePurpose; 7] = CA_KEY_USAGES;

/// Bytes of entropy in a random serial (128 bits, sign bit cleared).
const SERIAL_LEN: usize = 16;

/// Builds the leaf parameters for `names`, valid from `now`.
///
/// The hostname list is checked before anything is drawn from `rng`.
pub fn build<S, R>(
    names: &[S],
    now: OffsetDateTime,
    serial: &SerialPolicy,
    rng: &mut R,
) -> CaResult<CertificateParams>
where
    S: AsRef<str>,
    R: RngCore + CryptoRng + ?Sized,
{
    let Some(first) = names.first() else {
        return Err(TemplateError::EmptyHostnames.into());
    };

    let mut subject_alt_names = Vec::with_capacity(names.len());
    for name in names {
        let name: &str = name.as_ref();
        subject_alt_names.push(SanType::DnsName(
            name.try_into()
                .map_err(|_| TemplateError::InvalidDnsName(name.to_string()))?,
        ));
    }

    let common_name: &str = first.as_ref();

    let mut params = CertificateParams::default();
    params.serial_number = Some(serial_number(serial, rng)?);
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.subject_alt_names = subject_alt_names;

    let not_before = truncate_to_seconds(now);
    params.not_before = not_before;
    params.not_after = not_before + LEAF_LIFETIME;

    params.key_usages = LEAF_KEY_USAGES.to_vec();
    params.is_ca = IsCa::ExplicitNoCa;
    params.use_authority_key_identifier_extension = true;

    Ok(params)
}

fn serial_number<R>(policy: &SerialPolicy, rng: &mut R) -> CaResult<SerialNumber>
where
    R: RngCore + CryptoRng + ?Sized,
{
    match policy {
        SerialPolicy::Fixed(n) => Ok(SerialNumber::from(*n)),
        SerialPolicy::Random => {
            let mut bytes = [0u8; SERIAL_LEN];
            rng.try_fill_bytes(&mut bytes).map_err(CaError::Entropy)?;
            bytes[0] &= 0x7f;
            // Serials must be positive.
            if bytes.iter().all(|b| *b == 0) {
                bytes[SERIAL_LEN - 1] = 1;
            }
            Ok(SerialNumber::from(bytes.to_vec()))
        }
    }
}

/// X.509 times carry whole seconds only.
fn truncate_to_seconds(t: OffsetDateTime) -> OffsetDateTime {
    t.replace_nanosecond(0).unwrap_or(t)
}
