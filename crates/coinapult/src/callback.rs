use crate::credential::SharedSecret;
use crate::error::Result;
use crate::signing::{ServerPublicKey, ecc_verify, hmac_verify};

/// Authenticate an inbound webhook or callback.
///
/// With an identity header present this is HMAC mode: the identity must
/// equal the stored key exactly and the signature must be the HMAC-SHA512
/// of the raw body. Without one it is ECC mode: the server signs callbacks
/// with its own key, so the signature verifies against [`ServerPublicKey`].
///
/// `raw_body` must be the received bytes exactly as they arrived; any
/// re-encoding before verification invalidates the signature.
pub fn authenticate_callback(
    received_key: Option<&str>,
    received_sign: &str,
    raw_body: &[u8],
    shared: Option<&SharedSecret>,
    server_key: &ServerPublicKey,
) -> Result<bool> {
    match received_key {
        Some(key) => {
            let Some(shared) = shared else {
                return Ok(false);
            };
            if key != shared.key {
                return Ok(false);
            }
            Ok(hmac_verify(raw_body, shared.secret.as_bytes(), received_sign))
        }
        None => ecc_verify(received_sign, raw_body, server_key.verifying_key()),
    }
}
