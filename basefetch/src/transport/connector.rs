//! TLS connector setup for the hyper client.
//!
//! TLS needs a crypto provider and root certificates, both feature-gated:
//!
//! - Crypto providers: `tls-ring` (default with `tls`) or `tls-aws-lc`.
//!   Without either, a provider installed through
//!   `rustls::crypto::CryptoProvider::install_default()` is used.
//! - Root certificates: `tls-native-roots` (default with `tls`) or
//!   `tls-webpki-roots`. Without either, the root store is empty and only
//!   plain `http://` URLs (or a custom [`ClientConfig`]) will work.

use std::sync::Arc;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::ClientConfig;

use crate::ClientError;

/// Whether both a feature-gated crypto provider and root certificates are
/// compiled in.
#[inline]
pub const fn has_tls_support() -> bool {
    cfg!(any(feature = "tls-ring", feature = "tls-aws-lc"))
        && cfg!(any(feature = "tls-native-roots", feature = "tls-webpki-roots"))
}

fn crypto_provider() -> Option<Arc<rustls::crypto::CryptoProvider>> {
    #[cfg(feature = "tls-ring")]
    return Some(Arc::new(rustls::crypto::ring::default_provider()));

    #[cfg(all(feature = "tls-aws-lc", not(feature = "tls-ring")))]
    return Some(Arc::new(rustls::crypto::aws_lc_rs::default_provider()));

    #[cfg(not(any(feature = "tls-ring", feature = "tls-aws-lc")))]
    rustls::crypto::CryptoProvider::get_default().cloned()
}

fn root_store() -> rustls::RootCertStore {
    #[allow(unused_mut)]
    let mut roots = rustls::RootCertStore::empty();

    #[cfg(feature = "tls-native-roots")]
    {
        let native = rustls_native_certs::load_native_certs();
        if !native.errors.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(errors = ?native.errors, "some native root certificates failed to load");
        }
        roots.add_parsable_certificates(native.certs);
    }

    #[cfg(all(feature = "tls-webpki-roots", not(feature = "tls-native-roots")))]
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    roots
}

/// Build the default TLS configuration from the enabled features.
///
/// Fails when no crypto provider is available.
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let provider = crypto_provider().ok_or_else(|| {
        ClientError::Transport(
            "no TLS crypto provider: enable `tls-ring` or `tls-aws-lc`, \
             or install one with CryptoProvider::install_default()"
                .to_string(),
        )
    })?;

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Transport(format!("TLS configuration failed: {}", e)))?
        .with_root_certificates(root_store())
        .with_no_client_auth();
    Ok(config)
}

/// Build a connector that speaks both `http://` and `https://`.
pub fn build_https_connector(tls_config: ClientConfig) -> HttpsConnector<HttpConnector> {
    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_all_versions()
        .build()
}
