use k256::ecdsa::Signature;

use crate::error::{Error, Result};

/// Wire length of a compact signature: two 32-byte scalars as hex.
const COMPACT_LEN: usize = 128;

/// Render an ECDSA signature in the compact wire form.
///
/// Each of `r` and `s` is an unsigned big-endian integer padded to exactly
/// 32 bytes and written as lowercase hex, concatenated `r‖s`. DER is never
/// transmitted; peers rebuild it from these scalars.
pub fn encode_compact(signature: &Signature) -> String {
    hex::encode(signature.to_bytes())
}

/// Parse a compact wire signature back into an ECDSA signature.
///
/// Anything that is not exactly 128 hex characters, or whose scalars fall
/// outside the curve order, is `MalformedSignature`. High-S signatures are
/// normalized: remote signers are not required to produce low-S form, but
/// the verifier only accepts it.
pub fn decode_compact(signature: &str) -> Result<Signature> {
    if signature.len() != COMPACT_LEN {
        return Err(Error::MalformedSignature(format!(
            "expected {COMPACT_LEN} hex characters, got {}",
            signature.len()
        )));
    }
    let bytes = hex::decode(signature)
        .map_err(|e| Error::MalformedSignature(format!("invalid hex: {e}")))?;
    let parsed = Signature::from_slice(&bytes)
        .map_err(|e| Error::MalformedSignature(format!("invalid scalar pair: {e}")))?;
    Ok(parsed.normalize_s().unwrap_or(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::ecdsa::signature::Signer;
    use rand_chacha::ChaCha20Rng;
    use rand_chacha::rand_core::SeedableRng;
    use sha2::{Digest, Sha256};

    fn test_key(seed: &str) -> SigningKey {
        let hash = Sha256::digest(seed.as_bytes());
        SigningKey::random(&mut ChaCha20Rng::from_seed(hash.into()))
    }

    #[test]
    fn round_trips_real_signatures() {
        let key = test_key("compact-roundtrip");
        for message in [&b"alpha"[..], b"beta", b"gamma", b"delta", b"epsilon"] {
            let signature: Signature = key.sign(message);
            let encoded = encode_compact(&signature);
            assert_eq!(encoded.len(), 128);
            assert_eq!(decode_compact(&encoded).unwrap(), signature);
        }
    }

    #[test]
    fn agrees_with_der_round_trip() {
        // The compact form must carry exactly the (r, s) pair that DER
        // does, including scalars DER prefixes with a sign byte.
        let key = test_key("der-interop");
        for i in 0u8..16 {
            let signature: Signature = key.sign(&[i]);
            let der = signature.to_der();
            let from_der = Signature::from_der(der.as_bytes()).unwrap();
            assert_eq!(encode_compact(&from_der), encode_compact(&signature));
            assert_eq!(
                decode_compact(&encode_compact(&signature)).unwrap().to_der().as_bytes(),
                der.as_bytes()
            );
        }
    }

    #[test]
    fn pads_small_scalars_to_32_bytes() {
        let mut bytes = [0u8; 64];
        bytes[31] = 1;
        bytes[63] = 2;
        let signature = Signature::from_slice(&bytes).unwrap();

        let encoded = encode_compact(&signature);
        assert_eq!(encoded.len(), 128);
        assert!(encoded.starts_with(&"0".repeat(63)));
        assert_eq!(decode_compact(&encoded).unwrap(), signature);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = decode_compact(&"a".repeat(127)).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
        let err = decode_compact(&"a".repeat(129)).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
        let err = decode_compact("").unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
    }

    #[test]
    fn rejects_non_hex_of_correct_length() {
        let err = decode_compact(&"z".repeat(128)).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
    }

    #[test]
    fn rejects_zero_scalars() {
        let err = decode_compact(&"0".repeat(128)).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
    }
}
