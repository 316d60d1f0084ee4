use serde_json::json;

use crate::credential::EccIdentity;
use crate::encoding::Params;
use crate::error::{Error, Result};

/// Progress of the ECC account handshake.
///
/// `create` leaves the identity usable for provisioning but inactive; only
/// `activate` reaches `Registered`, after which normal signed calls are
/// allowed. There is no way back: replacing a key pair means provisioning a
/// new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    Unregistered,
    Registered,
}

/// Outcome of the `create` step.
///
/// `terms` is the server's hash of its current terms of service and `info`
/// the accompanying text; callers present these before activating. The full
/// decoded body is kept in `raw` for fields this struct does not model.
#[derive(Debug, Clone)]
pub struct AccountCreated {
    pub terms: Option<String>,
    pub info: Option<String>,
    pub raw: serde_json::Value,
}

impl AccountCreated {
    pub(crate) fn from_body(raw: serde_json::Value) -> Self {
        Self {
            terms: raw.get("terms").and_then(|v| v.as_str()).map(String::from),
            info: raw.get("info").and_then(|v| v.as_str()).map(String::from),
            raw,
        }
    }
}

/// Check the `success` field of a provisioning response against the local
/// identity.
///
/// The server echoes the fingerprint of the key it bound; anything else
/// means a different key was substituted in transit, and provisioning must
/// abort.
pub fn confirm_fingerprint(body: &serde_json::Value, identity: &EccIdentity) -> Result<()> {
    if let Some(success) = body.get("success").and_then(|v| v.as_str()) {
        if success != identity.fingerprint() {
            return Err(Error::UnexpectedPublicKey {
                expected: identity.fingerprint().to_string(),
                received: success.to_string(),
            });
        }
    }
    Ok(())
}

/// Parameters for the `activate` step: the decision and the fingerprint of
/// the key being activated.
pub(crate) fn activation_params(agree: bool, fingerprint: &str) -> Params {
    let mut params = Params::new();
    params.insert("agree".into(), json!(agree));
    params.insert("hash".into(), json!(fingerprint));
    params
}
