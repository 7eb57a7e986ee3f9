//! Vault session state — the single place the derived key lives.
//!
//! The key sits behind `Mutex<Option<SecretBytes<32>>>`:
//! - `None` while locked (before unlock, after lock)
//! - `Some(key)` while unlocked
//!
//! Unlock/lock transitions and key reads all go through the same mutex, so
//! `lock()` can never interleave with an in-flight [`with_key`] decrypt
//! sequence. Dropping the `Some` zeroizes the key via `SecretBytes`'s
//! `Drop` impl — synchronously, before `lock()` returns.
//!
//! [`with_key`]: SessionManager::with_key

use std::sync::{Mutex, PoisonError};

use coffre_crypto_core::memory::SecretBytes;

use crate::error::VaultError;

/// Owns the unlocked/locked state and the session key.
///
/// This is the only cross-call mutable shared state in the vault core.
#[derive(Default)]
pub struct SessionManager {
    key: Mutex<Option<SecretBytes<32>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionManager(***)")
    }
}

impl SessionManager {
    /// Create a manager in the locked state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the session key, replacing (and zeroizing) any previous one.
    pub fn unlock(&self, key: SecretBytes<32>) {
        *self.guard() = Some(key);
    }

    /// Discard the session key. The key material is zeroized before this
    /// returns; a transition can never race a key read.
    pub fn lock(&self) {
        let taken = self.guard().take();
        drop(taken); // SecretBytes zeroizes here
    }

    /// `true` while a key is held.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.guard().is_some()
    }

    /// An owned copy of the session key (zeroizes independently on drop).
    ///
    /// Prefer [`with_key`](Self::with_key) for decrypt sequences — a copy
    /// outlives the mutex guard and a concurrent `lock()`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotUnlocked`] while locked.
    pub fn current_key(&self) -> Result<SecretBytes<32>, VaultError> {
        self.guard()
            .as_ref()
            .map(SecretBytes::duplicate)
            .ok_or(VaultError::NotUnlocked)
    }

    /// Run `f` with the session key under the session mutex.
    ///
    /// The closure's whole execution is mutually exclusive with
    /// `unlock`/`lock`, giving the single-writer, checked-read discipline
    /// the key requires. Keep closures short — they block transitions.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotUnlocked`] while locked, otherwise
    /// whatever `f` returns.
    pub fn with_key<R>(
        &self,
        f: impl FnOnce(&SecretBytes<32>) -> Result<R, VaultError>,
    ) -> Result<R, VaultError> {
        let guard = self.guard();
        let key = guard.as_ref().ok_or(VaultError::NotUnlocked)?;
        f(key)
    }

    /// Acquire the key mutex, recovering from poisoning — a panicked
    /// holder leaves the key either present or taken, both safe states.
    fn guard(&self) -> std::sync::MutexGuard<'_, Option<SecretBytes<32>>> {
        self.key.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
