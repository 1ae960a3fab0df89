//! Error types for validation and bundle production.

use thiserror::Error;

/// All possible errors raised while validating a packet or producing a
/// bundle.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Signature verification returned false.
    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    /// The signature names an algorithm the verifier does not implement.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Nack or timeout after all retries on a direct certificate interest.
    #[error("{0}")]
    CertFetchFailed(String),

    /// The trust policy denied the chain.
    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    /// Codec, naming or state error from the packet layer.
    #[error(transparent)]
    Packet(#[from] ndn_bundle_common::Error),
}
