// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Confidentiality Context
//
// One process-lifetime key shared by every entity of a run. The engine only
// ever seals and opens; nothing else depends on the cipher.

use std::sync::atomic::{AtomicU64, Ordering};

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfidentialityError {
    #[error("sealing failed")]
    Seal,
    #[error("token could not be opened with this key")]
    Open,
    #[error("opened payload is not valid UTF-8")]
    Encoding,
}

// ---------------------------------------------------------------------------
// SealedToken
// ---------------------------------------------------------------------------

/// Opaque sealed payload. Holders can copy it; only the context opens it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedToken {
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

impl SealedToken {
    pub fn to_hex(&self) -> String {
        format!("{}{}", hex::encode(self.nonce), hex::encode(&self.ciphertext))
    }
}

// ---------------------------------------------------------------------------
// ConfidentialityContext
// ---------------------------------------------------------------------------

pub struct ConfidentialityContext {
    cipher: ChaCha20Poly1305,
    nonce_counter: AtomicU64,
}

impl std::fmt::Debug for ConfidentialityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfidentialityContext")
            .field("sealed", &self.nonce_counter.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ConfidentialityContext {
    pub fn from_key(key: [u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
            nonce_counter: AtomicU64::new(0),
        }
    }

    /// Draw a fresh key from the run's random source.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        Self::from_key(key)
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedToken, ConfidentialityError> {
        let counter = self.nonce_counter.fetch_add(1, Ordering::Relaxed);
        let mut nonce = [0u8; 12];
        nonce[4..].copy_from_slice(&counter.to_be_bytes());
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| ConfidentialityError::Seal)?;
        Ok(SealedToken { nonce, ciphertext })
    }

    pub fn open(&self, token: &SealedToken) -> Result<String, ConfidentialityError> {
        let bytes = self
            .cipher
            .decrypt(Nonce::from_slice(&token.nonce), token.ciphertext.as_ref())
            .map_err(|_| ConfidentialityError::Open)?;
        String::from_utf8(bytes).map_err(|_| ConfidentialityError::Encoding)
    }

    /// Number of tokens sealed so far.
    pub fn sealed_count(&self) -> u64 {
        self.nonce_counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_round_trip() {
        let ctx = ConfidentialityContext::from_key([7u8; 32]);
        let token = ctx.seal("Pseudonym: AB12CD, Outcome: Accepted").unwrap();
        assert_eq!(ctx.open(&token).unwrap(), "Pseudonym: AB12CD, Outcome: Accepted");
    }

    #[test]
    fn test_token_hides_plaintext() {
        let ctx = ConfidentialityContext::from_key([1u8; 32]);
        let plaintext = "Pseudonym: SECRET, Priority: Urgent";
        let token = ctx.seal(plaintext).unwrap();
        let window = plaintext.as_bytes();
        assert!(
            !token.ciphertext.windows(window.len()).any(|w| w == window),
            "ciphertext leaks plaintext"
        );
        assert!(!token.to_hex().contains("SECRET"));
    }

    #[test]
    fn test_foreign_key_cannot_open() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ours = ConfidentialityContext::generate(&mut rng);
        let theirs = ConfidentialityContext::generate(&mut rng);
        let token = ours.seal("relay table").unwrap();
        assert!(matches!(theirs.open(&token), Err(ConfidentialityError::Open)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let ctx = ConfidentialityContext::from_key([9u8; 32]);
        let mut token = ctx.seal("energy 42.00").unwrap();
        token.ciphertext[0] ^= 0x01;
        assert!(ctx.open(&token).is_err());
    }

    #[test]
    fn test_nonces_are_unique() {
        let ctx = ConfidentialityContext::from_key([2u8; 32]);
        let a = ctx.seal("same").unwrap();
        let b = ctx.seal("same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(ctx.sealed_count(), 2);
    }

    proptest! {
        #[test]
        fn open_inverts_seal(text in ".{0,200}") {
            let ctx = ConfidentialityContext::from_key([5u8; 32]);
            let token = ctx.seal(&text).unwrap();
            prop_assert_eq!(ctx.open(&token).unwrap(), text);
        }
    }
}
