//! Vault error types for `coffre-vault`.

use coffre_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Cryptographic operation failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Operation needs the session key but the vault is locked.
    #[error("vault is locked")]
    NotUnlocked,

    /// Destructive operation attempted without an unlocked session.
    #[error("not authorized: operation requires an unlocked session")]
    NotAuthorized,

    /// Three failed answer attempts — the verification flow is dead.
    /// Start a new flow; the application itself is unaffected.
    #[error("too many failed attempts for this verification flow")]
    TooManyAttempts,

    /// Two of the submitted security questions share an id.
    #[error("duplicate security question: {0}")]
    DuplicateQuestion(u16),

    /// A security question answer is blank.
    #[error("blank answer for security question {0}")]
    IncompleteAnswer(u16),

    /// A question id is not part of the predefined catalog.
    #[error("unknown security question: {0}")]
    UnknownQuestion(u16),

    /// Recovery was attempted before any questions were configured.
    #[error("security questions are not configured")]
    QuestionsNotConfigured,

    /// No master credential exists yet — run first-time setup.
    #[error("vault is not initialized")]
    NotInitialized,

    /// A master credential already exists.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// The supplied master password failed verification.
    #[error("invalid password")]
    InvalidPassword,

    /// Biometric unlock requested but no escrow is enrolled.
    #[error("no biometric enrollment for this vault")]
    BiometricNotEnrolled,

    /// The platform biometric capability reported an error (not a plain
    /// failed match) — caller should fall back to another factor.
    #[error("biometric capability unavailable: {0}")]
    BiometricUnavailable(String),

    /// Item not found by id.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// SQLite storage error.
    #[error("database error: {0}")]
    Database(String),

    /// Export blob framing or version mismatch.
    #[error("blob format error: {0}")]
    BlobFormat(String),

    /// JSON (de)serialization failure for stored metadata.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
