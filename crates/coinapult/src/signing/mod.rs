mod compact;
mod ecc;
mod hmac;

pub use compact::{decode_compact, encode_compact};
pub use ecc::{COINAPULT_PUBLIC_KEY_PEM, ServerPublicKey, ecc_sign, ecc_verify};
pub use self::hmac::{hmac_sign, hmac_verify};

use crate::credential::Credential;
use crate::error::Result;

/// Sign a canonical payload with whichever mode the credential selects.
///
/// The payload is the exact base64 string produced by the canonical
/// encoder; it is signed as-is, never decoded first.
pub fn sign_payload(payload: &str, credential: &Credential) -> Result<String> {
    match credential {
        Credential::SharedSecret(shared) => {
            Ok(hmac_sign(payload.as_bytes(), shared.secret.as_bytes()))
        }
        Credential::Ecc(identity) => Ok(ecc_sign(payload.as_bytes(), identity.signing_key())),
    }
}
