//! Black-box cryptographic primitives for the tablemesh poker mesh.
//!
//! The wider specification treats signing, hashing, and authenticated
//! encryption as opaque collaborators: any EUF-CMA signature scheme,
//! collision-resistant 256-bit hash, and IND-CCA2 AEAD satisfy it. This
//! crate picks one sound instance of each (Ed25519, BLAKE3, ChaCha20-Poly1305)
//! so the rest of the workspace has something concrete to build against.

mod aead;
mod error;
mod hash;
mod sign;

pub use aead::{open, seal, SessionKey, NONCE_LEN};
pub use error::CryptoError;
pub use hash::{hash, Hash32, HASH_LEN};
pub use sign::{generate_keypair, PrivateKey, PublicKey, Signature, SIGNATURE_LEN};

/// Returns a cryptographically secure random byte array of length `N`.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut buf = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
