use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};

/// Request parameters, keyed lexicographically.
///
/// A `BTreeMap` makes canonical key order a property of the type: two maps
/// holding the same entries serialize identically no matter the insertion
/// order. Values are restricted to JSON scalars by the call sites.
pub type Params = BTreeMap<String, serde_json::Value>;

/// Canonically encode a parameter map for signing and transmission.
///
/// The encoding is base64(JSON) with keys in lexicographic order and no
/// escaping of `/`. The returned string is both the request body field
/// `data` and the exact message fed to the signer: the signature is over
/// this string, so any encoding divergence breaks authentication.
pub fn canonical_encode(params: &Params) -> Result<String> {
    let json = serde_json::to_vec(params).map_err(Error::Encoding)?;
    Ok(BASE64.encode(json))
}

/// Decode a base64(JSON) payload back into a JSON value.
pub fn decode_payload(data: &str) -> Result<serde_json::Value> {
    let raw = BASE64
        .decode(data)
        .map_err(|e| Error::InvalidResponse(format!("payload is not base64: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| Error::InvalidResponse(format!("payload is not JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_raw(encoded: &str) -> String {
        let bytes = BASE64.decode(encoded).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn insertion_order_does_not_change_encoding() {
        let mut forward = Params::new();
        forward.insert("amount".into(), json!("10"));
        forward.insert("currency".into(), json!("BTC"));

        let mut reverse = Params::new();
        reverse.insert("currency".into(), json!("BTC"));
        reverse.insert("amount".into(), json!("10"));

        assert_eq!(
            canonical_encode(&forward).unwrap(),
            canonical_encode(&reverse).unwrap()
        );
    }

    #[test]
    fn keys_are_sorted_lexicographically() {
        let mut params = Params::new();
        params.insert("b".into(), json!(2));
        params.insert("a".into(), json!(1));
        params.insert("c".into(), json!(3));

        let raw = decode_raw(&canonical_encode(&params).unwrap());
        assert_eq!(raw, r#"{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn slashes_are_not_escaped() {
        let mut params = Params::new();
        params.insert("endpoint".into(), json!("/t/receive/"));

        let raw = decode_raw(&canonical_encode(&params).unwrap());
        assert_eq!(raw, r#"{"endpoint":"/t/receive/"}"#);
    }

    #[test]
    fn scalar_types_survive_the_round_trip() {
        let mut params = Params::new();
        params.insert("agree".into(), json!(true));
        params.insert("amount".into(), json!("10"));
        params.insert("timestamp".into(), json!(1402917506));

        let decoded = decode_payload(&canonical_encode(&params).unwrap()).unwrap();
        assert_eq!(decoded["agree"], json!(true));
        assert_eq!(decoded["amount"], json!("10"));
        assert_eq!(decoded["timestamp"], json!(1402917506));
    }

    #[test]
    fn rejects_payloads_that_are_not_base64() {
        assert!(matches!(
            decode_payload("not base64!!"),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn rejects_payloads_that_are_not_json() {
        let encoded = BASE64.encode("plainly not json");
        assert!(matches!(
            decode_payload(&encoded),
            Err(Error::InvalidResponse(_))
        ));
    }
}
