use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::credential::Credential;
use crate::encoding::{Params, canonical_encode};
use crate::error::{Error, Result};
use crate::nonce::NonceProvider;
use crate::signing::sign_payload;

/// Header carrying the shared-secret identity.
pub const HEADER_KEY: &str = "cpt-key";
/// Header carrying the HMAC-SHA512 signature.
pub const HEADER_HMAC: &str = "cpt-hmac";
/// Header carrying the sender's public-key fingerprint on ECC calls.
pub const HEADER_ECC_PUB: &str = "cpt-ecc-pub";
/// Header carrying the full public key (base64 PEM) on bootstrap calls.
pub const HEADER_ECC_NEW: &str = "cpt-ecc-new";
/// Header carrying the compact ECC signature.
pub const HEADER_ECC_SIGN: &str = "cpt-ecc-sign";

/// Form field the canonical payload travels in.
pub const BODY_FIELD: &str = "data";

/// An authenticated request, ready for the transport: the headers to send
/// and the canonical payload for the `data` form field.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub headers: Vec<(&'static str, String)>,
    pub payload: String,
}

/// Builds signed request envelopes for one credential.
///
/// One builder covers both credential kinds and both call layouts; the
/// bootstrap flag is the only switch between the normal and provisioning
/// header sets.
pub struct RequestBuilder<'a> {
    credential: &'a Credential,
    nonces: &'a dyn NonceProvider,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(credential: &'a Credential, nonces: &'a dyn NonceProvider) -> Self {
        Self { credential, nonces }
    }

    /// Assemble and sign a request for `endpoint`.
    ///
    /// Every request carries a `timestamp`. Normal requests also carry a
    /// fresh `nonce` and the `endpoint` parameter, plus the caller's
    /// identity header. Bootstrap requests (`bootstrap = true`, account
    /// provisioning only) omit the nonce and send the full public key
    /// instead of the fingerprint: the server has no identity to look up
    /// yet, so the key itself must ride along, bound by the signature.
    pub fn build(
        &self,
        endpoint: &str,
        mut params: Params,
        bootstrap: bool,
    ) -> Result<SignedRequest> {
        params.insert("timestamp".into(), json!(Utc::now().timestamp()));

        let mut headers: Vec<(&'static str, String)> = Vec::new();
        match (self.credential, bootstrap) {
            (Credential::SharedSecret(_), true) => {
                return Err(Error::Signing(
                    "bootstrap requests require an ECC identity".into(),
                ));
            }
            (Credential::SharedSecret(shared), false) => {
                params.insert("nonce".into(), json!(self.nonces.nonce()));
                params.insert("endpoint".into(), json!(signed_endpoint(endpoint)));
                headers.push((HEADER_KEY, shared.key.clone()));
            }
            (Credential::Ecc(identity), false) => {
                params.insert("nonce".into(), json!(self.nonces.nonce()));
                params.insert("endpoint".into(), json!(signed_endpoint(endpoint)));
                headers.push((HEADER_ECC_PUB, identity.fingerprint().to_string()));
            }
            (Credential::Ecc(identity), true) => {
                headers.push((HEADER_ECC_NEW, BASE64.encode(identity.public_key_pem())));
            }
        }

        let payload = canonical_encode(&params)?;
        let signature = sign_payload(&payload, self.credential)?;
        match self.credential {
            Credential::SharedSecret(_) => headers.push((HEADER_HMAC, signature)),
            Credential::Ecc(_) => headers.push((HEADER_ECC_SIGN, signature)),
        }

        debug!(endpoint, bootstrap, "built signed request");
        Ok(SignedRequest { headers, payload })
    }
}

/// The signed `endpoint` parameter strips the `/api` routing prefix.
fn signed_endpoint(endpoint: &str) -> String {
    endpoint.strip_prefix("/api").unwrap_or(endpoint).to_string()
}
