//! `coffre-crypto-core` — Pure cryptographic primitives for COFFRE.
//!
//! This crate is the audit target: zero storage, zero network, zero async.
//! Everything here is a pure function of its inputs plus the OS CSPRNG.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod kdf;
pub mod symmetric;

pub mod slots;

pub mod biometric;

pub mod totp;

pub mod password;

pub use biometric::{derive_biometric_wrapping_key, generate_enrollment_token};
pub use error::CryptoError;
pub use kdf::{derive, hash_for_verification, verify_against_hash, KdfParams};
pub use memory::{disable_core_dumps, SecretBuffer, SecretBytes};
pub use password::{generate_random_password, CharsetConfig, DEFAULT_PASSWORD_LENGTH};
pub use slots::{unwrap_key, wrap_key, KeySlot, SlotPurpose, VAULT_KEY_LEN, WRAPPING_KEY_LEN};
pub use symmetric::{decrypt, encrypt, SealedData};
pub use totp::{
    decode_secret, generate_hotp, generate_totp, step_progress, time_remaining, validate_totp,
    OtpAlgorithm, OtpDigits, DEFAULT_PERIOD,
};
