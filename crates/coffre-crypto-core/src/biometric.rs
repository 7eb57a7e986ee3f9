//! Biometric wrapping-key derivation.
//!
//! The biometric unlock path stores a random 32-byte token in the OS
//! keychain behind the platform's biometric gate. When the external
//! capability reports a successful assertion, that token is released and
//! run through HKDF-SHA256 to produce the wrapping key for the biometric
//! [`KeySlot`](crate::slots::KeySlot). HKDF (not Argon2id) because the
//! token is already high-entropy CSPRNG output and the OS rate-limits
//! biometric attempts in hardware; the derivation only needs to be a
//! derivation, not a brute-force tax.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::hkdf;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::{SecretBuffer, SecretBytes};

/// HKDF salt for biometric derivation (domain separation).
const HKDF_SALT: &[u8] = b"coffre-biometric-v1";

/// HKDF info string.
const HKDF_INFO: &[u8] = b"vault-wrapping-key";

/// Minimum token length in bytes.
pub const MIN_TOKEN_LEN: usize = 16;

/// Enrollment token length in bytes.
pub const TOKEN_LEN: usize = 32;

/// Wrapping key length (256 bits).
const WRAPPING_KEY_LEN: usize = 32;

/// Marker type for `ring::hkdf::Prk::expand` — requests 32-byte output.
struct WrappingKeyLen;

impl hkdf::KeyType for WrappingKeyLen {
    fn len(&self) -> usize {
        WRAPPING_KEY_LEN
    }
}

/// Derive the 256-bit biometric wrapping key from a keychain token.
///
/// # Errors
///
/// Returns [`CryptoError::Biometric`] if the token is shorter than 16
/// bytes or HKDF fails.
pub fn derive_biometric_wrapping_key(token: &[u8]) -> Result<SecretBuffer, CryptoError> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(CryptoError::Biometric(format!(
            "biometric token too short: {} bytes (minimum {MIN_TOKEN_LEN})",
            token.len()
        )));
    }

    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, HKDF_SALT);
    let prk = salt.extract(token);
    let okm = prk
        .expand(&[HKDF_INFO], WrappingKeyLen)
        .map_err(|_| CryptoError::Biometric("HKDF expand failed".into()))?;

    let mut key_bytes = [0u8; WRAPPING_KEY_LEN];
    okm.fill(&mut key_bytes)
        .map_err(|_| CryptoError::Biometric("HKDF fill failed".into()))?;

    let buf = SecretBuffer::new(&key_bytes)?;
    key_bytes.zeroize();
    Ok(buf)
}

/// Generate a random enrollment token.
///
/// The secret half goes into the OS keychain behind the biometric gate;
/// the identifier half names the keychain entry and is not secret.
///
/// # Errors
///
/// Returns [`CryptoError::Biometric`] if the CSPRNG fails.
pub fn generate_enrollment_token() -> Result<(SecretBytes<TOKEN_LEN>, Vec<u8>), CryptoError> {
    let secret = SecretBytes::<TOKEN_LEN>::random()
        .map_err(|e| CryptoError::Biometric(format!("token generation failed: {e}")))?;

    let mut id = [0u8; 16];
    OsRng.fill_bytes(&mut id);
    Ok((secret, id.to_vec()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
