//! Cryptographic password generation.
//!
//! Character-based generation with configurable charsets, used by the
//! vault's generator screen. All randomness comes from `OsRng`; uniform
//! selection is delegated to `rand`'s unbiased range sampling.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::CryptoError;

/// Minimum allowed password length.
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Maximum allowed password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Default password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{}|;:',.<>?/~";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which character sets a generated password draws from.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharsetConfig {
    /// Include uppercase letters (A-Z).
    pub uppercase: bool,
    /// Include lowercase letters (a-z).
    pub lowercase: bool,
    /// Include digits (0-9).
    pub digits: bool,
    /// Include symbols.
    pub symbols: bool,
}

impl Default for CharsetConfig {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl CharsetConfig {
    fn enabled_sets(&self) -> Vec<&'static [u8]> {
        let mut sets = Vec::new();
        if self.uppercase {
            sets.push(UPPERCASE);
        }
        if self.lowercase {
            sets.push(LOWERCASE);
        }
        if self.digits {
            sets.push(DIGITS);
        }
        if self.symbols {
            sets.push(SYMBOLS);
        }
        sets
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate a random password of `length` characters.
///
/// At least one character from each enabled charset is guaranteed; the
/// remaining positions draw uniformly from the combined pool, and the
/// result is Fisher-Yates shuffled so the mandatory characters hold no
/// fixed positions.
///
/// # Errors
///
/// Returns [`CryptoError::PasswordGeneration`] if:
/// - `length` is outside `4..=128`
/// - no charset is enabled
/// - `length` is smaller than the number of enabled charsets
pub fn generate_random_password(
    length: usize,
    charsets: &CharsetConfig,
) -> Result<String, CryptoError> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(CryptoError::PasswordGeneration(format!(
            "length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}, got {length}"
        )));
    }

    let sets = charsets.enabled_sets();
    if sets.is_empty() {
        return Err(CryptoError::PasswordGeneration(
            "at least one charset must be enabled".into(),
        ));
    }
    if length < sets.len() {
        return Err(CryptoError::PasswordGeneration(format!(
            "length {length} cannot guarantee one character from each of {} charsets",
            sets.len()
        )));
    }

    let mut rng = rand::rngs::OsRng;
    let pool: Vec<u8> = sets.iter().flat_map(|s| s.iter().copied()).collect();

    let mut out: Vec<u8> = sets
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())])
        .collect();
    while out.len() < length {
        out.push(pool[rng.gen_range(0..pool.len())]);
    }
    out.shuffle(&mut rng);

    String::from_utf8(out)
        .map_err(|_| CryptoError::PasswordGeneration("generated non-ASCII bytes".into()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
