use serde_json::json;
use tracing::info;

use crate::account::{AccountCreated, ProvisioningState, activation_params, confirm_fingerprint};
use crate::callback;
use crate::credential::{Credential, EccIdentity, SharedSecret};
use crate::encoding::Params;
use crate::envelope::SignedEnvelope;
use crate::error::{Error, Result};
use crate::nonce::{NonceProvider, OsNonceProvider};
use crate::request::{BODY_FIELD, RequestBuilder, SignedRequest};
use crate::signing::ServerPublicKey;
use crate::transport::{HttpTransport, Transport};

pub const DEFAULT_BASE_URL: &str = "https://api.coinapult.com";

/// High-level API client.
///
/// Builds authenticated request envelopes, sends them through the injected
/// transport, and in ECC mode verifies the server's response envelope
/// before handing the body back. The client holds no mutable state other
/// than the provisioning progress of an ECC identity; all signing state is
/// immutable after construction.
pub struct CoinapultClient {
    base_url: String,
    credential: Option<Credential>,
    server_key: ServerPublicKey,
    nonces: Box<dyn NonceProvider>,
    transport: Box<dyn Transport>,
    state: ProvisioningState,
}

impl CoinapultClient {
    /// Client with no credential: only unsigned calls and ECC webhook
    /// verification are available.
    pub fn unauthenticated() -> Self {
        Self::assemble(None, ProvisioningState::Registered)
    }

    /// Client authenticating with an API key + secret (HMAC mode).
    pub fn with_shared_secret(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::assemble(
            Some(Credential::SharedSecret(SharedSecret::new(key, secret))),
            ProvisioningState::Registered,
        )
    }

    /// Client authenticating with an ECC identity the server already knows.
    pub fn with_ecc(identity: EccIdentity) -> Self {
        Self::assemble(Some(Credential::Ecc(identity)), ProvisioningState::Registered)
    }

    /// Client holding a fresh ECC identity that still has to go through the
    /// account handshake before normal signed calls are accepted.
    pub fn with_unregistered_ecc(identity: EccIdentity) -> Self {
        Self::assemble(Some(Credential::Ecc(identity)), ProvisioningState::Unregistered)
    }

    fn assemble(credential: Option<Credential>, state: ProvisioningState) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credential,
            server_key: ServerPublicKey::builtin(),
            nonces: Box::new(OsNonceProvider),
            transport: Box::new(HttpTransport::new()),
            state,
        }
    }

    /// Point the client at a different API host.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Substitute the nonce source (tests pin nonces through this).
    pub fn nonce_provider(mut self, nonces: Box<dyn NonceProvider>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Substitute the HTTP collaborator.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Substitute the server verification key (alternate deployments).
    pub fn server_key(mut self, server_key: ServerPublicKey) -> Self {
        self.server_key = server_key;
        self
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn provisioning_state(&self) -> ProvisioningState {
        self.state
    }

    /// Send a request to `endpoint`, authenticated when `sign` is true.
    ///
    /// Unsigned calls go out as plain GETs. Signed calls POST the canonical
    /// payload with the credential's headers; in ECC mode the response is a
    /// signed envelope and is verified before the decoded body is returned.
    pub async fn call(
        &self,
        endpoint: &str,
        params: Params,
        sign: bool,
    ) -> Result<serde_json::Value> {
        if !sign {
            let body = self
                .transport
                .get(&self.url(endpoint), &to_form(&params))
                .await?;
            return check_api_error(parse_json(&body)?);
        }

        let Some(credential) = &self.credential else {
            return Err(Error::Signing(
                "signed call without a configured credential".into(),
            ));
        };
        if matches!(credential, Credential::Ecc(_))
            && self.state != ProvisioningState::Registered
        {
            return Err(Error::Signing(
                "ECC identity has not completed account activation".into(),
            ));
        }

        let request =
            RequestBuilder::new(credential, self.nonces.as_ref()).build(endpoint, params, false)?;
        let body = self.post_signed(endpoint, &request).await?;
        let value = check_api_error(parse_json(&body)?)?;
        match credential {
            Credential::Ecc(_) => self.open_envelope(value),
            Credential::SharedSecret(_) => Ok(value),
        }
    }

    /// First provisioning step: announce the public key and receive the
    /// server's terms.
    ///
    /// The request is a bootstrap call carrying the full PEM key. The
    /// response envelope must verify against the server key, and its
    /// `success` field must echo our fingerprint; either failure aborts
    /// without touching the provisioning state. The identity stays inactive
    /// until [`activate_account`](Self::activate_account).
    pub async fn create_account(&mut self, extra: Params) -> Result<AccountCreated> {
        let (credential, identity) = self.ecc_credential()?;
        let request = RequestBuilder::new(credential, self.nonces.as_ref())
            .build("/api/account/create", extra, true)?;
        let body = self.post_signed("/api/account/create", &request).await?;
        let value = check_api_error(parse_json(&body)?)?;
        let decoded = self.open_envelope(value)?;
        confirm_fingerprint(&decoded, identity)?;
        info!(fingerprint = identity.fingerprint(), "account created, awaiting activation");
        Ok(AccountCreated::from_body(decoded))
    }

    /// Second provisioning step: accept or decline the terms sent at
    /// creation. Agreement moves the identity to `Registered`, unlocking
    /// normal signed calls.
    pub async fn activate_account(&mut self, agree: bool) -> Result<serde_json::Value> {
        let request = {
            let (credential, identity) = self.ecc_credential()?;
            let params = activation_params(agree, identity.fingerprint());
            RequestBuilder::new(credential, self.nonces.as_ref())
                .build("/api/account/activate", params, true)?
        };
        let body = self.post_signed("/api/account/activate", &request).await?;
        let value = check_api_error(parse_json(&body)?)?;
        let decoded = self.open_envelope(value)?;
        if agree {
            self.state = ProvisioningState::Registered;
            info!("ECC identity activated");
        }
        Ok(decoded)
    }

    /// Exchange rates, the one unauthenticated operation.
    pub async fn ticker(
        &self,
        market: Option<&str>,
        filter: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut params = Params::new();
        if let Some(market) = market {
            params.insert("market".into(), json!(market));
        }
        if let Some(filter) = filter {
            params.insert("filter".into(), json!(filter));
        }
        self.call("/api/ticker/", params, false).await
    }

    /// Balances and account details.
    pub async fn account_info(&self) -> Result<serde_json::Value> {
        let mut params = Params::new();
        params.insert("balanceType".into(), json!("all"));
        params.insert("locksAsBTC".into(), json!("0"));
        self.call("/api/accountInfo/", params, true).await
    }

    /// Request a fresh bitcoin deposit address.
    pub async fn new_bitcoin_address(&self) -> Result<serde_json::Value> {
        self.call("/api/getBitcoinAddress/", Params::new(), true).await
    }

    /// Authenticate an inbound webhook against this client's credentials.
    /// See [`callback::authenticate_callback`] for the mode selection.
    pub fn authenticate_callback(
        &self,
        received_key: Option<&str>,
        received_sign: &str,
        raw_body: &[u8],
    ) -> Result<bool> {
        let shared = match &self.credential {
            Some(Credential::SharedSecret(shared)) => Some(shared),
            _ => None,
        };
        callback::authenticate_callback(received_key, received_sign, raw_body, shared, &self.server_key)
    }

    fn ecc_credential(&self) -> Result<(&Credential, &EccIdentity)> {
        match &self.credential {
            Some(credential @ Credential::Ecc(identity)) => Ok((credential, identity)),
            _ => Err(Error::Signing("operation requires an ECC identity".into())),
        }
    }

    fn open_envelope(&self, value: serde_json::Value) -> Result<serde_json::Value> {
        let envelope: SignedEnvelope = serde_json::from_value(value)
            .map_err(|e| Error::InvalidResponse(format!("expected signed envelope: {e}")))?;
        envelope.open(&self.server_key)
    }

    async fn post_signed(&self, endpoint: &str, request: &SignedRequest) -> Result<String> {
        let form = vec![(BODY_FIELD.to_string(), request.payload.clone())];
        self.transport
            .post_form(&self.url(endpoint), &form, &request.headers)
            .await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

fn parse_json(body: &str) -> Result<serde_json::Value> {
    serde_json::from_str(body)
        .map_err(|e| Error::InvalidResponse(format!("response is not JSON: {e}")))
}

/// The API reports failures in-band as `{"error": ...}`.
fn check_api_error(value: serde_json::Value) -> Result<serde_json::Value> {
    if let Some(error) = value.get("error") {
        let message = error
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(Error::Api(message));
    }
    Ok(value)
}

fn to_form(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_surface_from_the_body() {
        let err = check_api_error(json!({"error": "invalid nonce"})).unwrap_err();
        assert!(matches!(err, Error::Api(message) if message == "invalid nonce"));
    }

    #[test]
    fn bodies_without_error_pass_through() {
        let value = check_api_error(json!({"transaction_id": "abc"})).unwrap();
        assert_eq!(value["transaction_id"], json!("abc"));
    }

    #[test]
    fn form_rendering_unquotes_strings() {
        let mut params = Params::new();
        params.insert("amount".into(), json!("10"));
        params.insert("many".into(), json!(1));
        params.insert("agree".into(), json!(true));

        let form = to_form(&params);
        assert_eq!(
            form,
            vec![
                ("agree".to_string(), "true".to_string()),
                ("amount".to_string(), "10".to_string()),
                ("many".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn url_joins_without_doubling_slashes() {
        let client =
            CoinapultClient::with_shared_secret("k", "s").base_url("https://example.com/");
        assert_eq!(client.url("/api/ticker/"), "https://example.com/api/ticker/");
    }

    #[tokio::test]
    async fn unauthenticated_client_refuses_signed_calls() {
        let client = CoinapultClient::unauthenticated();
        let err = client
            .call("/api/accountInfo/", Params::new(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
