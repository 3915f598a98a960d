use crate::error::CryptoError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::Zeroize;

pub const NONCE_LEN: usize = 12;

/// A symmetric session key shared between two peers (established at
/// peer-handshake time, §4.9) or between the mental-poker dealer and a
/// single player (§4.5). Replaces the development-only XOR "encryption"
/// flagged in §9 with a real IND-CCA2 AEAD.
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        Self(crate::random_bytes::<32>())
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Authenticated-encrypt `plaintext` under `key` with a freshly drawn nonce,
/// returning `nonce || ciphertext`.
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let nonce_bytes = crate::random_bytes::<NONCE_LEN>();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .expect("chacha20poly1305 encryption is infallible for well-formed inputs");
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    out
}

/// Authenticated-decrypt a `nonce || ciphertext` blob produced by [`seal`].
/// Frames that fail authentication are rejected rather than silently
/// truncated (§4.9 "received frames that fail authentication are silently
/// dropped" is enforced by the caller discarding the `Err`).
pub fn open(key: &SessionKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_LEN {
        return Err(CryptoError::BadAuthenticator);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key.0));
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::BadAuthenticator)
}
