//! AES-256-GCM authenticated encryption for item payloads and key wrapping.
//!
//! This module provides:
//! - [`encrypt`] — seal plaintext under a fresh random nonce, returning
//!   [`SealedData`]
//! - [`decrypt`] — open and authenticate [`SealedData`], returning a
//!   [`SecretBuffer`]
//!
//! A unique 96-bit nonce is drawn from the OS CSPRNG inside every
//! [`encrypt`] call — there is no API through which a caller could supply
//! (and therefore reuse) a nonce. Decryption failure is a single opaque
//! [`CryptoError::Decryption`]: wrong key, flipped ciphertext bit, modified
//! nonce, and AAD mismatch all present identically.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// AES-256-GCM nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Minimum serialized length: nonce + tag (empty plaintext).
const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Authenticated ciphertext record — the at-rest shape of every encrypted
/// value in the vault.
///
/// `ciphertext` carries the GCM tag appended to the encrypted bytes, so
/// `ciphertext.len() == plaintext.len() + 16`. The nonce travels with the
/// record; it is not secret, only never-reused.
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedData {
    /// 96-bit random nonce, unique per encryption.
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted bytes with the 128-bit authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl SealedData {
    /// Serialize to the single-column wire form: `nonce || ciphertext+tag`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN.saturating_add(self.ciphertext.len()));
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialize from the wire form produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encryption` if the input is shorter than the
    /// 28-byte minimum (12-byte nonce + 16-byte tag).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_SEALED_LEN {
            return Err(CryptoError::Encryption(format!(
                "sealed record too short: {} bytes (minimum {MIN_SEALED_LEN})",
                bytes.len()
            )));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self {
            nonce,
            ciphertext: bytes[NONCE_LEN..].to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Seal / open
// ---------------------------------------------------------------------------

/// Encrypt plaintext under AES-256-GCM with a fresh random nonce.
///
/// `aad` is authenticated but not encrypted; the same bytes must be
/// presented to [`decrypt`]. It is used for domain separation (item type
/// tags, key-slot purposes) so records cannot be replayed across contexts.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the key is not exactly 32 bytes or
/// the underlying seal operation fails.
pub fn encrypt(plaintext: &[u8], key: &[u8], aad: &[u8]) -> Result<SealedData, CryptoError> {
    let sealing_key = gcm_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    if sealing_key
        .seal_in_place_append_tag(nonce, aead::Aad::from(aad), &mut in_out)
        .is_err()
    {
        in_out.zeroize();
        return Err(CryptoError::Encryption("AES-256-GCM seal failed".into()));
    }

    Ok(SealedData {
        nonce: nonce_bytes,
        ciphertext: in_out,
    })
}

/// Decrypt and authenticate a [`SealedData`] record.
///
/// Returns the plaintext as a [`SecretBuffer`] (zeroized on drop). The
/// working buffer is zeroized after the copy.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` for a wrong-length key, and the
/// constant-shape `CryptoError::Decryption` for every authentication
/// failure.
pub fn decrypt(sealed: &SealedData, key: &[u8], aad: &[u8]) -> Result<SecretBuffer, CryptoError> {
    let opening_key = gcm_key(key)?;
    let nonce = aead::Nonce::assume_unique_for_key(sealed.nonce);

    let mut in_out = sealed.ciphertext.clone();
    let plaintext_slice = opening_key
        .open_in_place(nonce, aead::Aad::from(aad), &mut in_out)
        .map_err(|_| CryptoError::Decryption)?;

    let result = SecretBuffer::new(plaintext_slice)
        .map_err(|e| CryptoError::SecureMemory(format!("secure buffer allocation failed: {e}")))?;
    in_out.zeroize();
    Ok(result)
}

/// Build a `LessSafeKey` from raw key bytes, validating the length.
fn gcm_key(key: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::Encryption(format!(
            "invalid key length: {} bytes (expected {KEY_LEN})",
            key.len()
        )));
    }
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| CryptoError::Encryption("failed to create AES-256-GCM key".into()))?;
    Ok(aead::LessSafeKey::new(unbound))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
