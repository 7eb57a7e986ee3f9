//! Master credential lifecycle — first-run setup, password change,
//! biometric enrollment, vault fingerprint.
//!
//! The session key is always the Argon2id derivation of the master secret
//! and the stored salt; it is never persisted. Changing the master secret
//! therefore re-encrypts every sealed row under the new key and re-seals
//! the escrows, all inside one storage transaction — a failure anywhere
//! leaves the old credential and key material fully in effect.

use coffre_crypto_core::biometric::derive_biometric_wrapping_key;
use coffre_crypto_core::kdf::{self, KdfParams, SALT_LEN};
use coffre_crypto_core::memory::SecretBytes;
use coffre_crypto_core::slots::{self, KeySlot, SlotPurpose};
use coffre_crypto_core::symmetric::{self, SealedData};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::generator::HISTORY_AAD;
use crate::session::SessionManager;
use crate::store::SqliteStore;

/// AAD for the session key sealed under the biometric intermediate key.
const BIOMETRIC_SESSION_AAD: &[u8] = b"coffre-escrow-biometric-session";

/// AAD for the biometric intermediate key sealed under the session key.
const BIOMETRIC_KEY_AAD: &[u8] = b"coffre-escrow-biometric-key";

// ---------------------------------------------------------------------------
// Master credential
// ---------------------------------------------------------------------------

/// The stored master credential — everything needed to verify the master
/// secret and re-derive the session key. The raw secret never appears.
#[derive(Debug, Clone)]
pub struct MasterCredential {
    /// Random salt for both derivations.
    pub salt: [u8; SALT_LEN],
    /// PBKDF2 verification hash of the master secret.
    pub verification_hash: [u8; 32],
    /// PBKDF2 iteration count the hash was computed with.
    pub verification_iterations: u32,
    /// Argon2id parameters for session-key derivation.
    pub kdf_params: KdfParams,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-mutation timestamp.
    pub updated_at: String,
}

impl MasterCredential {
    /// Constant-time check of a candidate master secret.
    ///
    /// # Errors
    ///
    /// Returns a crypto error only for unusable stored parameters; a wrong
    /// secret is `Ok(false)`.
    pub fn verify(&self, secret: &str) -> Result<bool, VaultError> {
        Ok(kdf::verify_against_hash(
            secret.as_bytes(),
            &self.salt,
            self.verification_iterations,
            &self.verification_hash,
        )?)
    }

    /// Derive the session key for this credential from the master secret.
    ///
    /// Blocking by design (Argon2id).
    ///
    /// # Errors
    ///
    /// Returns a crypto error on derivation failure.
    pub fn derive_session_key(&self, secret: &str) -> Result<SecretBytes<32>, VaultError> {
        let buf = kdf::derive(secret.as_bytes(), &self.salt, &self.kdf_params)?;
        Ok(SecretBytes::from_slice(buf.expose())?)
    }
}

// ---------------------------------------------------------------------------
// Biometric escrow
// ---------------------------------------------------------------------------

/// The biometric unlock bundle.
///
/// A random intermediate key is wrapped under the HKDF of the keychain
/// token (stable across password changes); the session key is sealed under
/// the intermediate (re-sealed on password change); and the intermediate is
/// sealed under the session key so a password change can re-seal without
/// the token being present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricEscrow {
    /// Intermediate key wrapped under HKDF(token).
    pub intermediate: KeySlot,
    /// Session key sealed under the intermediate key.
    pub session_under_intermediate: SealedData,
    /// Intermediate key sealed under the session key.
    pub intermediate_under_session: SealedData,
}

impl BiometricEscrow {
    /// Build a fresh escrow for the current session key and keychain token.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Biometric`](coffre_crypto_core::CryptoError)
    /// (wrapped) for an unusable token, or a seal failure.
    pub fn enroll(session_key: &SecretBytes<32>, token: &[u8]) -> Result<Self, VaultError> {
        let wrapping = derive_biometric_wrapping_key(token)?;
        let intermediate_key = SecretBytes::<32>::random()?;

        Ok(Self {
            intermediate: slots::wrap_key(
                intermediate_key.expose(),
                wrapping.expose(),
                SlotPurpose::Biometric,
            )?,
            session_under_intermediate: symmetric::encrypt(
                session_key.expose(),
                intermediate_key.expose(),
                BIOMETRIC_SESSION_AAD,
            )?,
            intermediate_under_session: symmetric::encrypt(
                intermediate_key.expose(),
                session_key.expose(),
                BIOMETRIC_KEY_AAD,
            )?,
        })
    }

    /// Recover the session key from an asserted keychain token.
    ///
    /// The token goes through the same HKDF derivation as at enrollment —
    /// biometric success never bypasses derivation.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` (wrapped) for a wrong token.
    pub fn unlock_session_key(&self, token: &[u8]) -> Result<SecretBytes<32>, VaultError> {
        let wrapping = derive_biometric_wrapping_key(token)?;
        let intermediate_key = slots::unwrap_key(&self.intermediate, wrapping.expose())?;
        let opened = symmetric::decrypt(
            &self.session_under_intermediate,
            intermediate_key.expose(),
            BIOMETRIC_SESSION_AAD,
        )?;
        Ok(SecretBytes::from_slice(opened.expose())?)
    }

    /// Re-seal for a new session key; the token-wrapped intermediate
    /// carries over untouched.
    ///
    /// # Errors
    ///
    /// Fails if `old_session_key` cannot open the stored intermediate.
    pub(crate) fn reseal(
        &self,
        old_session_key: &SecretBytes<32>,
        new_session_key: &SecretBytes<32>,
    ) -> Result<Self, VaultError> {
        let intermediate_key = symmetric::decrypt(
            &self.intermediate_under_session,
            old_session_key.expose(),
            BIOMETRIC_KEY_AAD,
        )?;
        Ok(Self {
            intermediate: self.intermediate.clone(),
            session_under_intermediate: symmetric::encrypt(
                new_session_key.expose(),
                intermediate_key.expose(),
                BIOMETRIC_SESSION_AAD,
            )?,
            intermediate_under_session: symmetric::encrypt(
                intermediate_key.expose(),
                new_session_key.expose(),
                BIOMETRIC_KEY_AAD,
            )?,
        })
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// First-run setup: create the master credential.
///
/// Generates a random 16-byte salt, computes the verification hash, and
/// stores the credential. Does not unlock — verification goes through
/// [`IdentityVerifier`](crate::identity::IdentityVerifier).
///
/// # Errors
///
/// - [`VaultError::AlreadyInitialized`] if a credential exists
/// - `CryptoError::WeakParameters` (wrapped) for a sub-floor config
pub fn initialize(
    store: &SqliteStore,
    config: &VaultConfig,
    master_secret: &str,
) -> Result<(), VaultError> {
    if store.is_initialized()? {
        return Err(VaultError::AlreadyInitialized);
    }
    config.kdf_params.check_strength().map_err(VaultError::from)?;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let verification_hash = kdf::hash_for_verification(
        master_secret.as_bytes(),
        &salt,
        config.verification_iterations,
    )?;

    let now = now_iso8601();
    store.save_credential(&MasterCredential {
        salt,
        verification_hash,
        verification_iterations: config.verification_iterations,
        kdf_params: config.kdf_params.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

/// Change the master secret.
///
/// Verifies the old secret, derives fresh salt/hash/key, re-encrypts every
/// item and generator-history row, and re-seals both escrows — committed
/// as one transaction. If the session was unlocked it stays unlocked under
/// the new key; if it was locked it stays locked.
///
/// # Errors
///
/// - [`VaultError::NotInitialized`] with no credential
/// - [`VaultError::InvalidPassword`] if `old_secret` fails verification
/// - any storage or crypto failure — in which case nothing was applied
pub fn change_master_password(
    store: &mut SqliteStore,
    session: &SessionManager,
    config: &VaultConfig,
    old_secret: &str,
    new_secret: &str,
) -> Result<(), VaultError> {
    let credential = store.load_credential()?.ok_or(VaultError::NotInitialized)?;
    if !credential.verify(old_secret)? {
        return Err(VaultError::InvalidPassword);
    }
    let old_key = credential.derive_session_key(old_secret)?;

    // New credential material.
    let mut new_salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut new_salt);
    let new_hash = kdf::hash_for_verification(
        new_secret.as_bytes(),
        &new_salt,
        config.verification_iterations,
    )?;
    let new_key_buf = kdf::derive(new_secret.as_bytes(), &new_salt, &config.kdf_params)?;
    let new_key = SecretBytes::<32>::from_slice(new_key_buf.expose())?;

    // Re-seal every item under the new key. Any decrypt failure aborts the
    // whole change before a single row is written.
    let mut resealed_items = Vec::new();
    for item in store.list_all_items()? {
        let plaintext =
            symmetric::decrypt(&item.sealed, old_key.expose(), item.item_type.aad_tag())?;
        let sealed =
            symmetric::encrypt(plaintext.expose(), new_key.expose(), item.item_type.aad_tag())?;
        resealed_items.push((item.id, sealed));
    }

    let mut resealed_history = Vec::new();
    for (id, sealed, _) in store.list_history()? {
        let plaintext = symmetric::decrypt(&sealed, old_key.expose(), HISTORY_AAD)?;
        let resealed = symmetric::encrypt(plaintext.expose(), new_key.expose(), HISTORY_AAD)?;
        resealed_history.push((id, resealed));
    }

    let biometric = store
        .load_biometric_escrow()?
        .map(|escrow| escrow.reseal(&old_key, &new_key))
        .transpose()?;
    let recovery = store
        .load_recovery_escrow()?
        .map(|escrow| escrow.reseal(&old_key, &new_key))
        .transpose()?;

    let new_credential = MasterCredential {
        salt: new_salt,
        verification_hash: new_hash,
        verification_iterations: config.verification_iterations,
        kdf_params: config.kdf_params.clone(),
        created_at: credential.created_at,
        updated_at: now_iso8601(),
    };

    store.apply_password_change(
        &new_credential,
        &resealed_items,
        &resealed_history,
        biometric.as_ref(),
        recovery.as_ref(),
    )?;

    if session.is_unlocked() {
        session.unlock(new_key);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Biometric enrollment
// ---------------------------------------------------------------------------

/// Enroll (or re-enroll) biometric unlock with a keychain token.
///
/// # Errors
///
/// Returns [`VaultError::NotUnlocked`] while locked, or an escrow failure.
pub fn enroll_biometric(
    store: &SqliteStore,
    session: &SessionManager,
    token: &[u8],
) -> Result<(), VaultError> {
    let session_key = session.current_key()?;
    let escrow = BiometricEscrow::enroll(&session_key, token)?;
    store.save_biometric_escrow(&escrow)
}

/// Remove the biometric enrollment. Idempotent.
///
/// # Errors
///
/// Returns [`VaultError::Database`] on storage failure.
pub fn remove_biometric(store: &SqliteStore) -> Result<(), VaultError> {
    store.clear_biometric_escrow()
}

/// `true` if a biometric escrow is enrolled.
///
/// # Errors
///
/// Returns [`VaultError::Database`] on storage failure.
pub fn has_biometric(store: &SqliteStore) -> Result<bool, VaultError> {
    Ok(store.load_biometric_escrow()?.is_some())
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// BLAKE3 fingerprint of the credential metadata, formatted
/// `XXXX-XXXX-XXXX-XXXX`.
///
/// Identifies a vault to sync adapters (same credential → same
/// fingerprint on every device) without revealing key material.
///
/// # Errors
///
/// Returns [`VaultError::NotInitialized`] with no credential.
pub fn vault_fingerprint(store: &SqliteStore) -> Result<String, VaultError> {
    let credential = store.load_credential()?.ok_or(VaultError::NotInitialized)?;
    Ok(fingerprint_credential(&credential))
}

/// Fingerprint a credential value directly (used by export headers).
#[must_use]
pub(crate) fn fingerprint_credential(credential: &MasterCredential) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&credential.salt);
    hasher.update(&credential.verification_hash);
    hasher.update(&credential.verification_iterations.to_le_bytes());
    hasher.update(&credential.kdf_params.m_cost.to_le_bytes());
    hasher.update(&credential.kdf_params.t_cost.to_le_bytes());
    hasher.update(&credential.kdf_params.p_cost.to_le_bytes());
    let hex = hasher.finalize().to_hex();

    let mut grouped = String::with_capacity(19);
    for (idx, c) in hex.as_str().chars().take(16).enumerate() {
        if idx > 0 && idx % 4 == 0 {
            grouped.push('-');
        }
        grouped.push(c.to_ascii_uppercase());
    }
    grouped
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Generate a RFC 4122 version-4 UUID string from `OsRng`.
pub(crate) fn generate_uuid() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);

    // Set version (4) and variant (RFC 4122).
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

/// Current UTC time as an ISO 8601 string (no `chrono` dependency).
pub(crate) fn now_iso8601() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let (year, month, day, hour, minute, second) = epoch_to_utc(duration.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Convert epoch seconds to (year, month, day, hour, minute, second) UTC.
///
/// Simplified civil-calendar computation (valid 1970–9999), adapted from
/// Howard Hinnant's `civil_from_days`.
#[allow(clippy::arithmetic_side_effects)]
const fn epoch_to_utc(epoch_secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let secs_per_day: u64 = 86_400;
    let total_days = epoch_secs / secs_per_day;
    let remaining_secs = epoch_secs % secs_per_day;

    let hour = remaining_secs / 3600;
    let minute = (remaining_secs % 3600) / 60;
    let second = remaining_secs % 60;

    // Days since 0000-03-01 (shifted epoch for leap year handling).
    let z = total_days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };

    (year, m, d, hour, minute, second)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
