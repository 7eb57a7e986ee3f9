//! Injected vault configuration.
//!
//! Every tunable the core consumes arrives through this one value, passed
//! at construction — there is no ambient global state. The defaults are
//! production-grade; tests construct their own `VaultConfig` with the
//! smallest parameters the work floor accepts.

use coffre_crypto_core::kdf::{KdfParams, MIN_VERIFICATION_ITERATIONS};
use serde::{Deserialize, Serialize};

/// Default PBKDF2 iteration count for verification hashes.
const DEFAULT_VERIFICATION_ITERATIONS: u32 = 600_000;

/// Default cap on security-answer attempts per verification flow.
const DEFAULT_MAX_ANSWER_ATTEMPTS: u8 = 3;

/// Vault-wide configuration, injected into every component that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Argon2id parameters for encryption-key derivation.
    pub kdf_params: KdfParams,
    /// PBKDF2-HMAC-SHA256 iterations for verification hashes
    /// (master password and security answers).
    pub verification_iterations: u32,
    /// Security-answer attempts allowed per verification flow before the
    /// flow locks. Hard cap, no time-based backoff.
    pub max_answer_attempts: u8,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_params: KdfParams::default(),
            verification_iterations: DEFAULT_VERIFICATION_ITERATIONS,
            max_answer_attempts: DEFAULT_MAX_ANSWER_ATTEMPTS,
        }
    }
}
