use rand::RngCore;
use rand::rngs::OsRng;

/// Random bytes per nonce; rendered as twice as many hex characters.
const NONCE_BYTES: usize = 10;

/// Source of per-request nonces.
///
/// An explicit seam rather than global RNG state, so tests can pin the
/// nonce and assert on the exact signed payload.
pub trait NonceProvider: Send + Sync {
    fn nonce(&self) -> String;
}

/// Nonces drawn from the operating system CSPRNG. Safe for concurrent use;
/// `OsRng` holds no shared state.
pub struct OsNonceProvider;

impl NonceProvider for OsNonceProvider {
    fn nonce(&self) -> String {
        let mut buf = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut buf);
        hex::encode(buf)
    }
}

/// Returns the same nonce on every call. Test use only.
pub struct FixedNonceProvider(pub String);

impl NonceProvider for FixedNonceProvider {
    fn nonce(&self) -> String {
        self.0.clone()
    }
}
