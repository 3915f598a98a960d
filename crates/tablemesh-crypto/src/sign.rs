use crate::error::CryptoError;
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 public key, the `public_key` half of a node's identity (§3).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "serde_bytes32")] [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::MalformedPublicKey)?;
        Ok(Self(bytes))
    }

    fn verifying_key(&self) -> VerifyingKey {
        // Constructed only through `from_bytes`/`generate_keypair`, both of
        // which already validated the encoding.
        VerifyingKey::from_bytes(&self.0).expect("validated at construction")
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.verifying_key()
            .verify(message, &sig)
            .map_err(|_| CryptoError::BadSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &hex::encode(self.0)[..8])
    }
}

/// An Ed25519 private key. Zeroized on drop; never (de)serialised as part of
/// wire messages — only loaded from local key material.
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(SigningKey::from_bytes(&bytes))
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        let mut bytes = self.0.to_bytes();
        bytes.zeroize();
    }
}

/// A detached Ed25519 signature, covering every field of a log entry except
/// itself (§3 "signature — covers every field above").
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "serde_bytes64")] [u8; SIGNATURE_LEN]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", &hex::encode(self.0)[..8])
    }
}

/// Generates a fresh Ed25519 keypair for a new node identity (§4.1 / C2).
pub fn generate_keypair() -> (PrivateKey, PublicKey) {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let public = PublicKey(signing_key.verifying_key().to_bytes());
    (PrivateKey(signing_key), public)
}

mod serde_bytes32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let v: Vec<u8> = Vec::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

mod serde_bytes64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 64], D::Error> {
        let v: Vec<u8> = Vec::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("expected 64 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trips() {
        let (sk, pk) = generate_keypair();
        let sig = sk.sign(b"hand 1 action 1");
        assert!(pk.verify(b"hand 1 action 1", &sig).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let (sk, pk) = generate_keypair();
        let sig = sk.sign(b"bet 100");
        assert!(pk.verify(b"bet 1000", &sig).is_err());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let (sk, _pk) = generate_keypair();
        let (_sk2, pk2) = generate_keypair();
        let sig = sk.sign(b"fold");
        assert!(pk2.verify(b"fold", &sig).is_err());
    }
}
