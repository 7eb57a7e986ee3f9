//! Cryptographic error types for `coffre-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// KDF parameters below the configured work-factor floor.
    #[error("weak derivation parameters: {0}")]
    WeakParameters(String),

    /// Key derivation failed (parameter validation, memory allocation).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Symmetric encryption failure (AES-256-GCM seal path).
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Authentication failed on decrypt — wrong key, tampered data, or
    /// AAD mismatch. Deliberately carries no detail: the failure shape
    /// is identical for every cause.
    #[error("decryption failed: authentication tag mismatch")]
    Decryption,

    /// Invalid key material (wrong length, corrupted bytes).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// A shared OTP secret failed Base32/Base64 decoding at ingestion.
    #[error("invalid secret encoding: {0}")]
    InvalidSecretEncoding(String),

    /// TOTP/HOTP generation or validation error.
    #[error("OTP error: {0}")]
    Otp(String),

    /// Secure memory allocation failure (mlock, CSPRNG fill).
    #[error("secure memory error: {0}")]
    SecureMemory(String),

    /// Biometric token derivation failure.
    #[error("biometric error: {0}")]
    Biometric(String),

    /// Password generation failure (invalid parameters).
    #[error("password generation error: {0}")]
    PasswordGeneration(String),
}
