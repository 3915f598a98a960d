use thiserror::Error;

/// Failure modes for the crypto primitives (§1, §7 input/integrity errors).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("signature did not verify against the claimed public key")]
    BadSignature,
    #[error("malformed public key bytes")]
    MalformedPublicKey,
    #[error("malformed signature bytes")]
    MalformedSignature,
    #[error("authenticated decryption failed (bad authenticator)")]
    BadAuthenticator,
}
