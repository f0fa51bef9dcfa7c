//! Leaf certificate minting for TLS MitM.
//!
//! A [`LeafMinter`] takes a loaded [`CaCredential`] and a hostname list and
//! signs a fresh, short-lived [`LeafCertificate`] for it. Nothing is cached
//! here; callers that want reuse keep their own map of leaves.

mod credential;
mod error;
mod keygen;
mod leaf;
mod minter;
mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use credential::CaCredential;
pub use error::{CaError, CaResult, ErrorKind, TemplateError};
pub use keygen::LeafKeyPair;
pub use leaf::{CertificateInfo, ECDSA_WITH_SHA512_OID, LeafCertificate};
pub use minter::LeafMinter;
pub use template::{CA_KEY_USAGES, LEAF_KEY_USAGES, LEAF_LIFETIME};
