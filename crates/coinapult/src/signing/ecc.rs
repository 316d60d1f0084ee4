use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::pkcs8::DecodePublicKey;

use super::compact::{decode_compact, encode_compact};
use crate::error::{Error, Result};

/// Production public key of the API server, fixed at build time. Response
/// envelopes and ECC-mode callbacks verify against this key.
pub const COINAPULT_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFYwEAYHKoZIzj0CAQYFK4EEAAoDQgAEWp9wd4EuLhIZNaoUgZxQztSjrbqgTT0w
LBq8RwigNE6nOOXFEoGCjGfekugjrHWHUi8ms7bcfrowpaJKqMfZXg==
-----END PUBLIC KEY-----";

/// Verifying key owned by the remote service.
#[derive(Clone)]
pub struct ServerPublicKey(VerifyingKey);

impl ServerPublicKey {
    /// The built-in production key.
    pub fn builtin() -> Self {
        Self::from_pem(COINAPULT_PUBLIC_KEY_PEM).expect("embedded server key is valid")
    }

    /// Parse a server key from SPKI PEM. Lets tests and alternate
    /// deployments of the protocol substitute their own key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| Error::Signing(format!("invalid server public key: {e}")))?;
        Ok(Self(key))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// ECDSA-SHA256 over secp256k1, in the compact wire form.
///
/// RFC 6979 deterministic: the same key and message always produce the
/// same signature.
pub fn ecc_sign(message: &[u8], key: &SigningKey) -> String {
    let signature: Signature = key.sign(message);
    encode_compact(&signature)
}

/// Verify a compact signature over `message`.
///
/// A well-formed signature that does not match is `Ok(false)`; only a
/// malformed signature string is an error.
pub fn ecc_verify(signature: &str, message: &[u8], key: &VerifyingKey) -> Result<bool> {
    let signature = decode_compact(signature)?;
    Ok(key.verify(message, &signature).is_ok())
}
