//! Leaf certificate minting for TLS-intercepting proxies.
//!
//! Given a CA certificate with its private key and the hostnames a client
//! asked for (usually its SNI), this crate signs a short-lived leaf
//! certificate that a proxy can present in place of the origin's.
//!
//! # Architecture
//!
//! Minting is one synchronous pipeline with no retries:
//! 1. Validate that the credential is a CA whose key matches its certificate
//! 2. Generate a fresh ECDSA P-521 key pair from the supplied random source
//! 3. Build the leaf template (CN, SANs, 24 hour validity, key usage)
//! 4. Sign with the CA key using ECDSA with SHA-512
//! 5. Parse the signed bytes back into a [`ca::CertificateInfo`]
//!
//! Any failure aborts the pipeline and no partial leaf is returned. Loading
//! CA files, caching leaves and socket handling are left to the caller;
//! [`tls::LeafResolver`] shows how a rustls server plugs the minter in.
//!
//! # Example
//!
//! ```no_run
//! use mitm_certgen::{CaCredential, LeafMinter};
//!
//! let ca = CaCredential::from_pem(
//!     &std::fs::read_to_string("ca.pem").unwrap(),
//!     &std::fs::read_to_string("ca.key").unwrap(),
//! )
//! .unwrap();
//! let leaf = LeafMinter::default()
//!     .mint(&ca, &["example.com", "www.example.com"])
//!     .unwrap();
//! println!("{}", leaf.cert_pem());
//! ```

pub mod ca;
mod config;
pub mod tls;

pub use ca::{CaCredential, CaError, CaResult, LeafCertificate, LeafMinter};
pub use config::{ConfigError, MinterConfig, SerialPolicy};
