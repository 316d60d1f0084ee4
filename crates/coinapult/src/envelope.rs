use serde::{Deserialize, Serialize};

use crate::encoding::decode_payload;
use crate::error::{Error, Result};
use crate::signing::{ServerPublicKey, ecc_verify};

/// ECC-mode response envelope.
///
/// `data` is base64 JSON; `sign` is a compact signature over the *literal*
/// `data` string, not the decoded bytes. Requests sign the other way around,
/// and both sides of the wire rely on the difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub sign: String,
    pub data: String,
}

impl SignedEnvelope {
    /// Verify the envelope against the server key and decode its payload.
    ///
    /// Fails closed: if the signature does not verify, the payload is never
    /// decoded and `InvalidServerSignature` is returned.
    pub fn open(&self, server_key: &ServerPublicKey) -> Result<serde_json::Value> {
        let authentic = ecc_verify(&self.sign, self.data.as_bytes(), server_key.verifying_key())?;
        if !authentic {
            return Err(Error::InvalidServerSignature);
        }
        decode_payload(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::EccIdentity;
    use crate::signing::ecc_sign;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use rand_chacha::ChaCha20Rng;
    use rand_chacha::rand_core::SeedableRng;
    use serde_json::json;
    use sha2::{Digest, Sha256};

    fn test_identity(seed: &str) -> EccIdentity {
        let hash = Sha256::digest(seed.as_bytes());
        EccIdentity::generate(&mut ChaCha20Rng::from_seed(hash.into())).unwrap()
    }

    fn server_pair(seed: &str) -> (EccIdentity, ServerPublicKey) {
        let identity = test_identity(seed);
        let key = ServerPublicKey::from_pem(identity.public_key_pem()).unwrap();
        (identity, key)
    }

    fn sealed(signer: &EccIdentity, body: serde_json::Value) -> SignedEnvelope {
        let data = BASE64.encode(serde_json::to_vec(&body).unwrap());
        let sign = ecc_sign(data.as_bytes(), signer.signing_key());
        SignedEnvelope { sign, data }
    }

    #[test]
    fn opens_a_correctly_signed_envelope() {
        let (server, server_key) = server_pair("envelope-server");
        let envelope = sealed(&server, json!({"success": "abc", "info": "hello"}));

        let body = envelope.open(&server_key).unwrap();
        assert_eq!(body["success"], json!("abc"));
        assert_eq!(body["info"], json!("hello"));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let (server, server_key) = server_pair("envelope-tamper");
        let mut envelope = sealed(&server, json!({"balance": "100"}));
        envelope.data = BASE64.encode(serde_json::to_vec(&json!({"balance": "999"})).unwrap());

        assert!(matches!(
            envelope.open(&server_key),
            Err(Error::InvalidServerSignature)
        ));
    }

    #[test]
    fn rejects_a_signature_from_another_key() {
        let (_, server_key) = server_pair("envelope-real");
        let impostor = test_identity("envelope-impostor");
        let envelope = sealed(&impostor, json!({"ok": 1}));

        assert!(matches!(
            envelope.open(&server_key),
            Err(Error::InvalidServerSignature)
        ));
    }

    #[test]
    fn malformed_signature_is_distinguished_from_mismatch() {
        let (_, server_key) = server_pair("envelope-malformed");
        let envelope = SignedEnvelope {
            sign: "definitely not hex".into(),
            data: BASE64.encode(b"{}"),
        };

        assert!(matches!(
            envelope.open(&server_key),
            Err(Error::MalformedSignature(_))
        ));
    }

    #[test]
    fn valid_signature_over_undecodable_data_is_invalid_response() {
        let (server, server_key) = server_pair("envelope-undecodable");
        let data = "@@not base64@@".to_string();
        let sign = ecc_sign(data.as_bytes(), server.signing_key());
        let envelope = SignedEnvelope { sign, data };

        assert!(matches!(
            envelope.open(&server_key),
            Err(Error::InvalidResponse(_))
        ));
    }
}
