//! Password generation with a sealed history.
//!
//! Generation itself is pure (`coffre-crypto-core::password`); this module
//! records each generated password in the store, sealed under the session
//! key, so the generator screen can show recent output without persisting
//! plaintext. The history is a reset category of its own.

use coffre_crypto_core::password::{generate_random_password, CharsetConfig};
use coffre_crypto_core::symmetric;
use zeroize::Zeroize;

use crate::error::VaultError;
use crate::lifecycle::{generate_uuid, now_iso8601};
use crate::session::SessionManager;
use crate::store::SqliteStore;

/// AAD for sealed generator-history rows.
pub(crate) const HISTORY_AAD: &[u8] = b"coffre-generator-history";

/// A decrypted history entry.
#[derive(Debug)]
pub struct GeneratedEntry {
    /// Row id.
    pub id: String,
    /// The generated password.
    pub password: String,
    /// ISO 8601 generation timestamp.
    pub created_at: String,
}

impl Drop for GeneratedEntry {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

/// Generate a password and record it in the sealed history.
///
/// # Errors
///
/// - [`VaultError::NotUnlocked`] while locked
/// - `CryptoError::PasswordGeneration` (wrapped) for bad parameters
pub fn generate_and_record(
    store: &SqliteStore,
    session: &SessionManager,
    length: usize,
    charsets: &CharsetConfig,
) -> Result<String, VaultError> {
    let password = generate_random_password(length, charsets)?;
    let sealed = session
        .with_key(|key| Ok(symmetric::encrypt(password.as_bytes(), key.expose(), HISTORY_AAD)?))?;
    store.insert_history(&generate_uuid(), &sealed, &now_iso8601())?;
    Ok(password)
}

/// Decrypt the history, newest first.
///
/// # Errors
///
/// Returns [`VaultError::NotUnlocked`] while locked, or a decryption
/// failure for rows sealed under a different key.
pub fn list_history(
    store: &SqliteStore,
    session: &SessionManager,
) -> Result<Vec<GeneratedEntry>, VaultError> {
    let rows = store.list_history()?;
    session.with_key(|key| {
        let mut entries = Vec::with_capacity(rows.len());
        for (id, sealed, created_at) in &rows {
            let plaintext = symmetric::decrypt(sealed, key.expose(), HISTORY_AAD)?;
            entries.push(GeneratedEntry {
                id: id.clone(),
                password: String::from_utf8_lossy(plaintext.expose()).into_owned(),
                created_at: created_at.clone(),
            });
        }
        Ok(entries)
    })
}

/// Remove every history row. Returns the number removed.
///
/// # Errors
///
/// Returns [`VaultError::Database`] on storage failure.
pub fn clear_history(store: &SqliteStore) -> Result<usize, VaultError> {
    store.clear_history()
}
