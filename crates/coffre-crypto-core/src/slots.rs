//! Key slots — wrapped copies of the vault encryption key for the
//! non-password unlock paths.
//!
//! The encryption key itself is derived from the master secret and is never
//! stored. Biometric unlock and security-question recovery each keep an
//! AES-256-GCM wrapped copy of that key instead, unwrappable only with a
//! wrapping key derived from their own secret (keychain token, normalized
//! answer pair). Every unlock path therefore ends in a derivation — none
//! bypasses it.
//!
//! ```text
//! Biometric token  ──HKDF──►  wrapping key ──► unwraps ──► encryption key
//! Answer pair      ──Argon2──► wrapping key ──► unwraps ──► encryption key
//! ```
//!
//! # Domain Separation
//!
//! Each [`SlotPurpose`] contributes a distinct AAD tag, so a biometric slot
//! record cannot be presented as a recovery slot or vice versa.

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use crate::symmetric::{self, SealedData};
use serde::{Deserialize, Serialize};

/// Vault encryption key length in bytes (256 bits).
pub const VAULT_KEY_LEN: usize = 32;

/// Wrapping key length in bytes (256 bits).
pub const WRAPPING_KEY_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The unlock path a slot serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotPurpose {
    /// Biometric token derived key (HKDF over the OS-keychain secret).
    Biometric,
    /// Security-question recovery key (Argon2id over a normalized answer pair).
    RecoveryPair,
}

impl SlotPurpose {
    /// AAD tag for this purpose — authenticated into the wrapped record.
    #[must_use]
    pub const fn aad_tag(&self) -> &'static [u8] {
        match self {
            Self::Biometric => b"coffre-slot-biometric",
            Self::RecoveryPair => b"coffre-slot-recovery-pair",
        }
    }

    /// String identifier used in storage records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Biometric => "biometric",
            Self::RecoveryPair => "recovery_pair",
        }
    }
}

/// A wrapped copy of the vault encryption key.
#[must_use = "key slot must be persisted with the credential"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySlot {
    /// The unlock path this slot serves.
    pub purpose: SlotPurpose,
    /// The encryption key sealed under the wrapping key.
    pub wrapped: SealedData,
}

// ---------------------------------------------------------------------------
// Wrap / unwrap
// ---------------------------------------------------------------------------

/// Wrap the vault encryption key into a new [`KeySlot`].
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] if either key is not exactly
/// 32 bytes, or [`CryptoError::Encryption`] if the seal operation fails.
pub fn wrap_key(
    vault_key: &[u8],
    wrapping_key: &[u8],
    purpose: SlotPurpose,
) -> Result<KeySlot, CryptoError> {
    check_len(vault_key, VAULT_KEY_LEN, "vault key")?;
    check_len(wrapping_key, WRAPPING_KEY_LEN, "wrapping key")?;

    let wrapped = symmetric::encrypt(vault_key, wrapping_key, purpose.aad_tag())?;
    Ok(KeySlot { purpose, wrapped })
}

/// Unwrap a [`KeySlot`], recovering the vault encryption key.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyMaterial`] for a wrong-length wrapping
/// key, or [`CryptoError::Decryption`] if the wrapping key is wrong, the
/// record is tampered, or the purpose AAD does not match.
pub fn unwrap_key(slot: &KeySlot, wrapping_key: &[u8]) -> Result<SecretBuffer, CryptoError> {
    check_len(wrapping_key, WRAPPING_KEY_LEN, "wrapping key")?;
    symmetric::decrypt(&slot.wrapped, wrapping_key, slot.purpose.aad_tag())
}

fn check_len(key: &[u8], expected: usize, label: &str) -> Result<(), CryptoError> {
    if key.len() != expected {
        return Err(CryptoError::InvalidKeyMaterial(format!(
            "invalid {label} length: {} bytes (expected {expected})",
            key.len()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_VAULT_KEY: [u8; VAULT_KEY_LEN] = [0xAA; VAULT_KEY_LEN];
    const TEST_WRAPPING_KEY: [u8; WRAPPING_KEY_LEN] = [0xBB; WRAPPING_KEY_LEN];
    const WRONG_WRAPPING_KEY: [u8; WRAPPING_KEY_LEN] = [0xCC; WRAPPING_KEY_LEN];

    #[test]
    fn wrap_unwrap_roundtrip_biometric() {
        let slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        assert_eq!(slot.purpose, SlotPurpose::Biometric);
        let key = unwrap_key(&slot, &TEST_WRAPPING_KEY).expect("unwrap should succeed");
        assert_eq!(key.expose(), &TEST_VAULT_KEY);
    }

    #[test]
    fn wrap_unwrap_roundtrip_recovery_pair() {
        let slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::RecoveryPair)
            .expect("wrap should succeed");
        let key = unwrap_key(&slot, &TEST_WRAPPING_KEY).expect("unwrap should succeed");
        assert_eq!(key.expose(), &TEST_VAULT_KEY);
    }

    #[test]
    fn unwrap_with_wrong_key_fails() {
        let slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        assert!(matches!(
            unwrap_key(&slot, &WRONG_WRAPPING_KEY),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn unwrap_with_tampered_record_fails() {
        let mut slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        if let Some(byte) = slot.wrapped.ciphertext.first_mut() {
            *byte ^= 0xFF;
        }
        assert!(matches!(
            unwrap_key(&slot, &TEST_WRAPPING_KEY),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn cross_purpose_unwrap_fails() {
        let slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        let forged = KeySlot {
            purpose: SlotPurpose::RecoveryPair,
            wrapped: slot.wrapped,
        };
        assert!(matches!(
            unwrap_key(&forged, &TEST_WRAPPING_KEY),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn wrap_rejects_bad_key_lengths() {
        assert!(matches!(
            wrap_key(&[0u8; 31], &TEST_WRAPPING_KEY, SlotPurpose::Biometric),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        assert!(matches!(
            wrap_key(&TEST_VAULT_KEY, &[0u8; 33], SlotPurpose::Biometric),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
        assert!(matches!(
            wrap_key(&[], &TEST_WRAPPING_KEY, SlotPurpose::Biometric),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn two_wraps_use_different_nonces() {
        let a = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        let b = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::Biometric)
            .expect("wrap should succeed");
        assert_ne!(a.wrapped.nonce, b.wrapped.nonce);
    }

    #[test]
    fn key_slot_serde_roundtrip() {
        let slot = wrap_key(&TEST_VAULT_KEY, &TEST_WRAPPING_KEY, SlotPurpose::RecoveryPair)
            .expect("wrap should succeed");
        let json = serde_json::to_string(&slot).expect("serialize should succeed");
        let back: KeySlot = serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(slot, back);
        let key = unwrap_key(&back, &TEST_WRAPPING_KEY).expect("unwrap should succeed");
        assert_eq!(key.expose(), &TEST_VAULT_KEY);
    }
}
