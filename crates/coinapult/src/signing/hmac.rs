use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 over `message`, rendered as lowercase hex.
///
/// Deterministic: same secret and message always yield the same signature.
pub fn hmac_sign(message: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a received hex signature against the HMAC of the
/// raw message. A signature that does not decode as hex is a mismatch, not
/// an error.
pub fn hmac_verify(message: &[u8], secret: &[u8], received_hex: &str) -> bool {
    let Ok(received) = hex::decode(received_hex) else {
        return false;
    };
    let mut mac = HmacSha512::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(&received).is_ok()
}
