//! rustls integration: serving minted leaves during the handshake.

use std::sync::Arc;

use rustls::ServerConfig;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use tracing::{debug, error};

use crate::ca::{CaCredential, CaResult, LeafMinter};

/// Certificate resolver that mints a leaf for the SNI of every handshake.
///
/// Every call signs a new certificate. Wrap the resolver if leaves should
/// be reused across connections.
pub struct LeafResolver {
    ca: Arc<CaCredential>,
    minter: LeafMinter,
}

impl LeafResolver {
    /// Creates a resolver signing with `ca`.
    pub fn new(ca: Arc<CaCredential>, minter: LeafMinter) -> Self {
        Self { ca, minter }
    }

    /// Mints a server identity for `sni`.
    pub fn resolve_name(&self, sni: &str) -> CaResult<Arc<CertifiedKey>> {
        let leaf = self.minter.mint(&self.ca, &[sni])?;
        Ok(Arc::new(leaf.certified_key()?))
    }
}

impl std::fmt::Debug for LeafResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafResolver").finish_non_exhaustive()
    }
}

impl ResolvesServerCert for LeafResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let Some(sni) = client_hello.server_name() else {
            debug!("client hello without SNI, no certificate to mint");
            return None;
        };
        debug!("resolving certificate for SNI: {}", sni);
        match self.resolve_name(sni) {
            Ok(key) => Some(key),
            Err(e) => {
                error!("failed to mint certificate for {}: {}", sni, e);
                None
            }
        }
    }
}

/// Creates a rustls ServerConfig that mints leaves on demand.
pub fn server_config(resolver: Arc<LeafResolver>) -> Result<Arc<ServerConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_cert_resolver(resolver);
    Ok(Arc::new(config))
}
