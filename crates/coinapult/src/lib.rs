//! Client-side authentication for the Coinapult API.
//!
//! Outbound requests carry a canonical base64(JSON) payload signed either
//! with a shared secret (HMAC-SHA512) or a secp256k1 key pair (ECDSA-SHA256
//! in the compact `r‖s` wire form). In ECC mode, responses and inbound
//! webhooks are themselves signed by the server and verify against its
//! fixed public key.

pub mod account;
pub mod callback;
pub mod client;
pub mod credential;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod nonce;
pub mod request;
pub mod signing;
pub mod transport;

pub use account::{AccountCreated, ProvisioningState};
pub use client::{CoinapultClient, DEFAULT_BASE_URL};
pub use credential::{Credential, EccIdentity, SharedSecret};
pub use encoding::{Params, canonical_encode, decode_payload};
pub use envelope::SignedEnvelope;
pub use error::{Error, Result};
pub use nonce::{FixedNonceProvider, NonceProvider, OsNonceProvider};
pub use request::{RequestBuilder, SignedRequest};
pub use signing::{ServerPublicKey, sign_payload};
pub use transport::{HttpTransport, Transport};
