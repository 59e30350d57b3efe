use std::sync::Once;

/// Install the ring crypto provider for rustls.
///
/// reqwest is built without a bundled provider, so this has to run before the
/// first client is created. Calling it more than once is a no-op.
pub fn ensure_crypto_provider() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        // Another crate in the process may already have installed one
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
