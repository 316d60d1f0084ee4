use thiserror::Error;

/// Errors produced by the signing core and the transport seam.
///
/// Signature mismatches are deliberately not errors: `ecc_verify` and
/// `authenticate_callback` report them as `false`, so callers branch on the
/// security-relevant outcome explicitly instead of catching exceptions.
#[derive(Debug, Error)]
pub enum Error {
    /// Request parameters could not be serialized for signing.
    #[error("failed to encode request parameters: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A key that cannot be used for signing (malformed PEM, wrong curve),
    /// or a signing operation attempted with the wrong credential kind.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature string that is not a well-formed compact signature.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// A response envelope whose signature does not verify against the
    /// server's public key.
    #[error("server signature verification failed")]
    InvalidServerSignature,

    /// The server acknowledged a public-key fingerprint other than ours
    /// during account provisioning.
    #[error("server acknowledged public key {received}, expected {expected}")]
    UnexpectedPublicKey { expected: String, received: String },

    /// Failure in the HTTP collaborator, propagated unchanged.
    #[error("transport error: {0}")]
    Transport(String),

    /// An error reported in-band by the API (`{"error": ...}` body).
    #[error("api error: {0}")]
    Api(String),

    /// A response body that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
