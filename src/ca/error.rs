//! Error types for leaf certificate minting.

/// The result type for CA operations.
pub type CaResult<T> = Result<T, CaError>;

/// Errors raised while building the leaf template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("hostname list is empty")]
    EmptyHostnames,
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CaError {
    #[error("invalid CA credential: {0}")]
    InvalidCa(String),
    #[error("invalid leaf template: {0}")]
    Template(#[from] TemplateError),
    #[error("secure random source failed: {0}")]
    Entropy(#[source] rand::Error),
    #[error("failed to generate key pair: {0}")]
    KeyGeneration(String),
    #[error("CA key algorithm {found} cannot produce {expected} signatures")]
    AlgorithmMismatch {
        found: String,
        expected: &'static str,
    },
    #[error("failed to sign certificate: {0}")]
    Signing(#[from] rcgen::Error),
    #[error("failed to create signing key: {0}")]
    SigningKey(#[source] rustls::Error),
    /// The signer emitted bytes that do not parse back as a certificate.
    #[error("signer produced a malformed certificate: {0}")]
    MalformedOutput(String),
}

/// The pipeline step a [`CaError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCa,
    Template,
    KeyGeneration,
    Signing,
    /// Internal inconsistency, not caused by caller input.
    Defect,
}

impl CaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaError::InvalidCa(_) => ErrorKind::InvalidCa,
            CaError::Template(_) => ErrorKind::Template,
            CaError::Entropy(_) | CaError::KeyGeneration(_) => ErrorKind::KeyGeneration,
            CaError::AlgorithmMismatch { .. } | CaError::Signing(_) | CaError::SigningKey(_) => {
                ErrorKind::Signing
            }
            CaError::MalformedOutput(_) => ErrorKind::Defect,
        }
    }

    /// Returns true if the error indicates a bug in the minter itself.
    pub fn is_defect(&self) -> bool {
        self.kind() == ErrorKind::Defect
    }
}
