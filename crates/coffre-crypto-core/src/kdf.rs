//! Key derivation — Argon2id for the encryption key, PBKDF2 for the
//! verification hash.
//!
//! This module provides:
//! - [`derive`] — derive the 256-bit vault encryption key from the master
//!   secret + salt using Argon2id
//! - [`hash_for_verification`] — PBKDF2-HMAC-SHA256 hash used only to check
//!   a typed master secret against the stored credential
//! - [`verify_against_hash`] — constant-time verification of a candidate
//!   secret against a stored hash
//! - [`KdfParams`] — serializable Argon2id parameter set (stored in the
//!   master credential and the export blob header)
//!
//! # Key Separation
//!
//! The encryption key and the verification hash are computed by different
//! KDFs over the same secret. Knowing the stored verification hash gives an
//! attacker no path to the encryption key — and the verification check never
//! has to pay the Argon2id memory cost.

use std::num::NonZeroU32;

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use ring::pbkdf2;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Output length of both KDFs in bytes (256 bits).
pub const OUTPUT_LEN: usize = 32;

/// Required salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Minimum Argon2id memory cost in KiB (8 MiB). Below this the derivation
/// is rejected as [`CryptoError::WeakParameters`].
pub const MIN_M_COST: u32 = 8_192;

/// Minimum Argon2id iteration count.
pub const MIN_T_COST: u32 = 1;

/// Minimum PBKDF2 iteration count for the verification hash.
pub const MIN_VERIFICATION_ITERATIONS: u32 = 100_000;

/// Default Argon2id memory cost in KiB (64 MiB).
const DEFAULT_M_COST: u32 = 65_536;

/// Default Argon2id iteration count.
const DEFAULT_T_COST: u32 = 3;

/// Default Argon2id parallelism.
const DEFAULT_P_COST: u32 = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Argon2id parameter set — persisted with the master credential so the
/// same key can be re-derived on any device.
///
/// Fields follow the `argon2` crate convention:
/// - `m_cost`: memory in KiB (NOT bytes, NOT MB)
/// - `t_cost`: number of iterations
/// - `p_cost`: degree of parallelism
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in kibibytes (64 MiB = `65_536`).
    pub m_cost: u32,
    /// Number of iterations (time cost).
    pub t_cost: u32,
    /// Degree of parallelism (number of lanes).
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: DEFAULT_M_COST,
            t_cost: DEFAULT_T_COST,
            p_cost: DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// Check the parameter set against the configured work-factor floor.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WeakParameters`] naming the offending field.
    pub fn check_strength(&self) -> Result<(), CryptoError> {
        if self.m_cost < MIN_M_COST {
            return Err(CryptoError::WeakParameters(format!(
                "m_cost {} KiB below minimum {MIN_M_COST} KiB",
                self.m_cost
            )));
        }
        if self.t_cost < MIN_T_COST {
            return Err(CryptoError::WeakParameters(format!(
                "t_cost {} below minimum {MIN_T_COST}",
                self.t_cost
            )));
        }
        if self.p_cost == 0 {
            return Err(CryptoError::WeakParameters("p_cost must be > 0".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Encryption key derivation (Argon2id)
// ---------------------------------------------------------------------------

/// Derive the 256-bit vault encryption key from a master secret and salt.
///
/// Pure function of its inputs; CPU- and memory-bound by design — callers
/// must treat it as a blocking operation, not something to retry rapidly.
///
/// # Errors
///
/// Returns:
/// - [`CryptoError::WeakParameters`] if `params` is below the work floor
/// - [`CryptoError::KeyDerivation`] if the secret is empty, the salt is not
///   exactly 16 bytes, or the derivation itself fails
pub fn derive(secret: &[u8], salt: &[u8], params: &KdfParams) -> Result<SecretBuffer, CryptoError> {
    params.check_strength()?;
    if secret.is_empty() {
        return Err(CryptoError::KeyDerivation("secret must not be empty".into()));
    }
    if salt.len() != SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be exactly {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let argon2_params =
        argon2::Params::new(params.m_cost, params.t_cost, params.p_cost, Some(OUTPUT_LEN))
            .map_err(|e| CryptoError::KeyDerivation(format!("invalid argon2 params: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params,
    );

    let mut output = [0u8; OUTPUT_LEN];
    argon2
        .hash_password_into(secret, salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(format!("argon2id derivation failed: {e}")))?;

    let result = SecretBuffer::new(&output)
        .map_err(|e| CryptoError::KeyDerivation(format!("secure buffer allocation failed: {e}")))?;
    output.zeroize();
    Ok(result)
}

// ---------------------------------------------------------------------------
// Verification hash (PBKDF2-HMAC-SHA256)
// ---------------------------------------------------------------------------

/// Compute the verification hash for a master secret.
///
/// The hash is stored alongside the salt and compared on every password
/// check. It shares no derivation path with [`derive`], so the stored hash
/// cannot be used to reconstruct the encryption key.
///
/// # Errors
///
/// Returns [`CryptoError::WeakParameters`] if `iterations` is below
/// [`MIN_VERIFICATION_ITERATIONS`], or [`CryptoError::KeyDerivation`] if
/// the secret is empty or the salt is not exactly 16 bytes.
pub fn hash_for_verification(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; OUTPUT_LEN], CryptoError> {
    let iterations = checked_iterations(iterations)?;
    if secret.is_empty() {
        return Err(CryptoError::KeyDerivation("secret must not be empty".into()));
    }
    if salt.len() != SALT_LEN {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be exactly {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, secret, &mut out);
    Ok(out)
}

/// Verify a candidate secret against a stored verification hash.
///
/// Uses `ring`'s constant-time comparison — the result does not leak where
/// the hashes first differ. Returns `false` for an empty candidate or a
/// wrong-length salt rather than erroring, so the caller's failure path is
/// uniform.
///
/// # Errors
///
/// Returns [`CryptoError::WeakParameters`] if `iterations` is below
/// [`MIN_VERIFICATION_ITERATIONS`].
pub fn verify_against_hash(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
    expected: &[u8; OUTPUT_LEN],
) -> Result<bool, CryptoError> {
    let iterations = checked_iterations(iterations)?;
    if secret.is_empty() || salt.len() != SALT_LEN {
        return Ok(false);
    }
    Ok(
        pbkdf2::verify(pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, secret, expected)
            .is_ok(),
    )
}

/// Validate the iteration count and convert to `NonZeroU32`.
fn checked_iterations(iterations: u32) -> Result<NonZeroU32, CryptoError> {
    if iterations < MIN_VERIFICATION_ITERATIONS {
        return Err(CryptoError::WeakParameters(format!(
            "verification iterations {iterations} below minimum {MIN_VERIFICATION_ITERATIONS}"
        )));
    }
    NonZeroU32::new(iterations)
        .ok_or_else(|| CryptoError::WeakParameters("iterations must be > 0".into()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
