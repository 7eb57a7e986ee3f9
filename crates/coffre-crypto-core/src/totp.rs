//! One-time password engine — RFC 4226 HOTP, RFC 6238 TOTP.
//!
//! This module provides:
//! - [`generate_hotp`] / [`generate_totp`] — code generation via
//!   `ring::hmac` (SHA-1, SHA-256, SHA-512)
//! - [`validate_totp`] — ±1 time-step acceptance with constant-time
//!   comparison (used when confirming a freshly enrolled secret)
//! - [`time_remaining`] / [`step_progress`] — display-countdown helpers
//! - [`decode_secret`] — Base32/Base64 secret ingestion
//!
//! The engine is stateless: the same `(secret, time)` pair always yields
//! the same code, nothing is mutated, and the ~1 s display tick belongs to
//! the caller — there is no timer in here.

use data_encoding::{BASE32_NOPAD, BASE64};
use ring::hmac;

use crate::CryptoError;

/// Default TOTP period in seconds (RFC 6238 §4).
pub const DEFAULT_PERIOD: u32 = 30;

/// Time-step acceptance window for validation (±1 step, RFC 6238 §5.2).
pub const TOTP_WINDOW: u32 = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// HMAC algorithm used for OTP generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OtpAlgorithm {
    /// HMAC-SHA1 (default for most authenticator apps).
    Sha1,
    /// HMAC-SHA256.
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl OtpAlgorithm {
    fn to_ring_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }
}

/// Number of digits in an OTP code — 6 or 8 only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OtpDigits {
    /// 6-digit code (standard).
    Six,
    /// 8-digit code.
    Eight,
}

impl OtpDigits {
    /// The numeric digit count.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Six => 6,
            Self::Eight => 8,
        }
    }

    /// Parse a digit count, rejecting anything but 6 or 8.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Otp` for unsupported counts.
    pub fn from_count(digits: u8) -> Result<Self, CryptoError> {
        match digits {
            6 => Ok(Self::Six),
            8 => Ok(Self::Eight),
            other => Err(CryptoError::Otp(format!(
                "unsupported digit count {other} (must be 6 or 8)"
            ))),
        }
    }

    /// Truncation modulus (10^digits).
    const fn modulus(self) -> u32 {
        match self {
            Self::Six => 1_000_000,
            Self::Eight => 100_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Secret ingestion
// ---------------------------------------------------------------------------

/// Decode a shared OTP secret from its textual form.
///
/// Accepts Base32 (RFC 4648 — case-insensitive, optional `=` padding,
/// spaces and dashes tolerated, the form every provisioning QR uses) and
/// falls back to standard Base64. The decoded bytes are returned exactly —
/// never truncated or padded to a "nicer" length.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidSecretEncoding`] if the text decodes
/// under neither alphabet or decodes to zero bytes.
pub fn decode_secret(text: &str) -> Result<Vec<u8>, CryptoError> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if compact.is_empty() {
        return Err(CryptoError::InvalidSecretEncoding("empty secret".into()));
    }

    let base32_form: String = compact
        .trim_end_matches('=')
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if let Ok(bytes) = BASE32_NOPAD.decode(base32_form.as_bytes()) {
        if !bytes.is_empty() {
            return Ok(bytes);
        }
    }

    if let Ok(bytes) = BASE64.decode(compact.as_bytes()) {
        if !bytes.is_empty() {
            return Ok(bytes);
        }
    }

    Err(CryptoError::InvalidSecretEncoding(
        "not valid Base32 or Base64".into(),
    ))
}

// ---------------------------------------------------------------------------
// HOTP (RFC 4226)
// ---------------------------------------------------------------------------

/// Generate an HOTP code per RFC 4226.
///
/// HMAC over the 8-byte big-endian counter (§5.2), dynamic truncation
/// (§5.3), decimal reduction to `digits` characters with leading zeros
/// preserved.
///
/// # Errors
///
/// Returns `CryptoError::Otp` if the secret is empty.
#[must_use = "OTP code should be used or stored"]
pub fn generate_hotp(
    secret: &[u8],
    counter: u64,
    digits: OtpDigits,
    algorithm: OtpAlgorithm,
) -> Result<String, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::Otp("secret must not be empty".to_owned()));
    }

    let key = hmac::Key::new(algorithm.to_ring_algorithm(), secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());
    let mac = tag.as_ref();

    // Dynamic truncation: offset = low nibble of the last byte, then a
    // 31-bit big-endian word starting at that offset.
    let offset = usize::from(mac[mac.len().wrapping_sub(1)] & 0x0F);
    let binary_code = u32::from_be_bytes([
        mac[offset] & 0x7F,
        mac[offset.wrapping_add(1)],
        mac[offset.wrapping_add(2)],
        mac[offset.wrapping_add(3)],
    ]);

    // modulus is 10^6 or 10^8 — never zero.
    #[allow(clippy::arithmetic_side_effects)]
    let code = binary_code % digits.modulus();
    let width = usize::from(digits.value());
    Ok(format!("{code:0>width$}"))
}

// ---------------------------------------------------------------------------
// TOTP (RFC 6238)
// ---------------------------------------------------------------------------

/// Generate a TOTP code per RFC 6238: HOTP over `floor(time / period)`.
///
/// # Errors
///
/// Returns `CryptoError::Otp` if `period` is 0 or the secret is empty.
#[must_use = "OTP code should be used or stored"]
pub fn generate_totp(
    secret: &[u8],
    time: u64,
    digits: OtpDigits,
    period: u32,
    algorithm: OtpAlgorithm,
) -> Result<String, CryptoError> {
    let step = time_step(time, period)?;
    generate_hotp(secret, step, digits, algorithm)
}

/// Validate a TOTP code against the ±[`TOTP_WINDOW`] steps around `time`.
///
/// Every candidate step is checked with a constant-time comparison; the
/// loop never exits early on a match, so validation time does not depend on
/// which step (if any) matched.
///
/// # Errors
///
/// Returns `CryptoError::Otp` if `period` is 0 or the secret is empty.
#[must_use = "validation result should be checked"]
pub fn validate_totp(
    secret: &[u8],
    time: u64,
    code: &str,
    digits: OtpDigits,
    period: u32,
    algorithm: OtpAlgorithm,
) -> Result<bool, CryptoError> {
    let step = time_step(time, period)?;

    let start = step.saturating_sub(u64::from(TOTP_WINDOW));
    let end = step.saturating_add(u64::from(TOTP_WINDOW));

    let mut valid = false;
    let mut candidate = start;
    loop {
        let expected = generate_hotp(secret, candidate, digits, algorithm)?;
        if constant_time_eq(expected.as_bytes(), code.as_bytes()) {
            valid = true;
        }
        if candidate == end {
            break;
        }
        candidate = candidate.wrapping_add(1);
    }
    Ok(valid)
}

/// Seconds until the current time step rolls over.
///
/// Pure function of the wall clock — recomputing it on every display tick
/// cannot drift. At an exact step boundary the full `period` is returned.
///
/// # Errors
///
/// Returns `CryptoError::Otp` if `period` is 0.
pub fn time_remaining(time: u64, period: u32) -> Result<u64, CryptoError> {
    if period == 0 {
        return Err(CryptoError::Otp("period must be > 0".to_owned()));
    }
    let period_u64 = u64::from(period);
    // period validated non-zero above.
    #[allow(clippy::arithmetic_side_effects)]
    let into_step = time % period_u64;
    Ok(period_u64.wrapping_sub(into_step))
}

/// Fraction of the current step already elapsed, in `0.0..1.0`.
///
/// # Errors
///
/// Returns `CryptoError::Otp` if `period` is 0.
pub fn step_progress(time: u64, period: u32) -> Result<f64, CryptoError> {
    let remaining = time_remaining(time, period)?;
    #[allow(clippy::cast_precision_loss)]
    Ok(1.0 - (remaining as f64 / f64::from(period)))
}

/// `floor(time / period)`, rejecting a zero period.
fn time_step(time: u64, period: u32) -> Result<u64, CryptoError> {
    if period == 0 {
        return Err(CryptoError::Otp("period must be > 0".to_owned()));
    }
    let period_u64 = u64::from(period);
    // period validated non-zero above.
    #[allow(clippy::arithmetic_side_effects)]
    Ok(time / period_u64)
}

/// Constant-time byte comparison for OTP codes.
///
/// The early length check is fine here: the digit count (6 or 8) is public.
/// The constant-time property protects the code value, not its length.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ── RFC 4226 Appendix D test vectors ────────────────────────────
    // Secret: "12345678901234567890" (ASCII), SHA1, 6 digits.
    const RFC4226_SECRET: &[u8] = b"12345678901234567890";

    const RFC4226_EXPECTED: [&str; 10] = [
        "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583", "399871",
        "520489",
    ];

    #[test]
    fn hotp_rfc4226_appendix_d_vectors() {
        for (counter, expected) in RFC4226_EXPECTED.iter().enumerate() {
            let code = generate_hotp(
                RFC4226_SECRET,
                counter as u64,
                OtpDigits::Six,
                OtpAlgorithm::Sha1,
            )
            .expect("HOTP generation should succeed");
            assert_eq!(&code, expected, "HOTP mismatch at counter {counter}");
        }
    }

    // ── RFC 6238 Appendix B test vectors ────────────────────────────
    const RFC6238_SECRET_SHA1: &[u8] = b"12345678901234567890";
    const RFC6238_SECRET_SHA256: &[u8] = b"12345678901234567890123456789012";
    const RFC6238_SECRET_SHA512: &[u8] =
        b"1234567890123456789012345678901234567890123456789012345678901234";

    struct Rfc6238Vector {
        time: u64,
        sha1: &'static str,
        sha256: &'static str,
        sha512: &'static str,
    }

    const RFC6238_VECTORS: [Rfc6238Vector; 6] = [
        Rfc6238Vector {
            time: 59,
            sha1: "94287082",
            sha256: "46119246",
            sha512: "90693936",
        },
        Rfc6238Vector {
            time: 1_111_111_109,
            sha1: "07081804",
            sha256: "68084774",
            sha512: "25091201",
        },
        Rfc6238Vector {
            time: 1_111_111_111,
            sha1: "14050471",
            sha256: "67062674",
            sha512: "99943326",
        },
        Rfc6238Vector {
            time: 1_234_567_890,
            sha1: "89005924",
            sha256: "91819424",
            sha512: "93441116",
        },
        Rfc6238Vector {
            time: 2_000_000_000,
            sha1: "69279037",
            sha256: "90698825",
            sha512: "38618901",
        },
        Rfc6238Vector {
            time: 20_000_000_000,
            sha1: "65353130",
            sha256: "77737706",
            sha512: "47863826",
        },
    ];

    #[test]
    fn totp_rfc6238_appendix_b_sha1() {
        for v in &RFC6238_VECTORS {
            let code = generate_totp(
                RFC6238_SECRET_SHA1,
                v.time,
                OtpDigits::Eight,
                30,
                OtpAlgorithm::Sha1,
            )
            .expect("TOTP generation should succeed");
            assert_eq!(&code, v.sha1, "SHA1 mismatch at time {}", v.time);
        }
    }

    #[test]
    fn totp_rfc6238_appendix_b_sha256() {
        for v in &RFC6238_VECTORS {
            let code = generate_totp(
                RFC6238_SECRET_SHA256,
                v.time,
                OtpDigits::Eight,
                30,
                OtpAlgorithm::Sha256,
            )
            .expect("TOTP generation should succeed");
            assert_eq!(&code, v.sha256, "SHA256 mismatch at time {}", v.time);
        }
    }

    #[test]
    fn totp_rfc6238_appendix_b_sha512() {
        for v in &RFC6238_VECTORS {
            let code = generate_totp(
                RFC6238_SECRET_SHA512,
                v.time,
                OtpDigits::Eight,
                30,
                OtpAlgorithm::Sha512,
            )
            .expect("TOTP generation should succeed");
            assert_eq!(&code, v.sha512, "SHA512 mismatch at time {}", v.time);
        }
    }

    // ── Determinism / statelessness ─────────────────────────────────

    #[test]
    fn same_inputs_same_code() {
        let a = generate_totp(b"secret", 1_234_567_890, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("generate");
        let b = generate_totp(b"secret", 1_234_567_890, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("generate");
        assert_eq!(a, b);
    }

    #[test]
    fn code_is_stable_within_a_step() {
        let a = generate_totp(b"secret", 90, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("generate");
        let b = generate_totp(b"secret", 119, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("generate");
        let c = generate_totp(b"secret", 120, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("generate");
        assert_eq!(a, b, "same step should yield same code");
        assert_ne!(b, c, "next step should yield a different code");
    }

    // ── Validation window ───────────────────────────────────────────

    #[test]
    fn validate_accepts_adjacent_steps_only() {
        let secret = b"12345678901234567890";
        let time = 1_234_567_890u64;
        let code =
            generate_totp(secret, time, OtpDigits::Six, 30, OtpAlgorithm::Sha1).expect("generate");

        for (offset, expected) in [(0u64, true), (30, true), (60, false)] {
            let valid = validate_totp(
                secret,
                time.wrapping_add(offset),
                &code,
                OtpDigits::Six,
                30,
                OtpAlgorithm::Sha1,
            )
            .expect("validate");
            assert_eq!(valid, expected, "offset +{offset}s");
        }
    }

    #[test]
    fn validate_at_time_zero_does_not_underflow() {
        let secret = b"12345678901234567890";
        let code =
            generate_totp(secret, 0, OtpDigits::Six, 30, OtpAlgorithm::Sha1).expect("generate");
        let valid = validate_totp(secret, 0, &code, OtpDigits::Six, 30, OtpAlgorithm::Sha1)
            .expect("validate");
        assert!(valid);
    }

    #[test]
    fn validate_rejects_wrong_length_code() {
        let valid = validate_totp(
            b"12345678901234567890",
            1_234_567_890,
            "12345",
            OtpDigits::Six,
            30,
            OtpAlgorithm::Sha1,
        )
        .expect("validate");
        assert!(!valid);
    }

    // ── Digits ──────────────────────────────────────────────────────

    #[test]
    fn output_lengths_match_digit_setting() {
        let six = generate_hotp(b"secret", 0, OtpDigits::Six, OtpAlgorithm::Sha1).expect("six");
        let eight =
            generate_hotp(b"secret", 0, OtpDigits::Eight, OtpAlgorithm::Sha1).expect("eight");
        assert_eq!(six.len(), 6);
        assert_eq!(eight.len(), 8);
    }

    #[test]
    fn from_count_accepts_only_6_and_8() {
        assert_eq!(OtpDigits::from_count(6).expect("6"), OtpDigits::Six);
        assert_eq!(OtpDigits::from_count(8).expect("8"), OtpDigits::Eight);
        for bad in [0u8, 4, 7, 9, 10] {
            assert!(OtpDigits::from_count(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn leading_zeros_preserved() {
        let secret = b"12345678901234567890";
        let mut found = false;
        for counter in 0u64..10_000 {
            let code = generate_hotp(secret, counter, OtpDigits::Six, OtpAlgorithm::Sha1)
                .expect("generate");
            if code.starts_with('0') {
                assert_eq!(code.len(), 6);
                found = true;
                break;
            }
        }
        assert!(found, "expected a leading-zero code within 10000 counters");
    }

    // ── Errors ──────────────────────────────────────────────────────

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            generate_hotp(&[], 0, OtpDigits::Six, OtpAlgorithm::Sha1),
            Err(CryptoError::Otp(_))
        ));
    }

    #[test]
    fn zero_period_is_rejected_everywhere() {
        assert!(generate_totp(b"secret", 1_000, OtpDigits::Six, 0, OtpAlgorithm::Sha1).is_err());
        assert!(
            validate_totp(b"secret", 1_000, "123456", OtpDigits::Six, 0, OtpAlgorithm::Sha1)
                .is_err()
        );
        assert!(time_remaining(1_000, 0).is_err());
        assert!(step_progress(1_000, 0).is_err());
    }

    // ── Countdown helpers ───────────────────────────────────────────

    #[test]
    fn time_remaining_counts_down_to_rollover() {
        assert_eq!(time_remaining(0, 30).expect("remaining"), 30);
        assert_eq!(time_remaining(1, 30).expect("remaining"), 29);
        assert_eq!(time_remaining(29, 30).expect("remaining"), 1);
        assert_eq!(time_remaining(30, 30).expect("remaining"), 30);
        assert_eq!(time_remaining(59, 30).expect("remaining"), 1);
    }

    #[test]
    fn time_remaining_never_drifts_across_ticks() {
        // Simulate a 1 Hz tick across several periods: remaining must walk
        // period..1 and snap back to period, never skipping or repeating.
        let period = 30u32;
        let mut previous = time_remaining(0, period).expect("remaining");
        for t in 1u64..150 {
            let now = time_remaining(t, period).expect("remaining");
            if previous == 1 {
                assert_eq!(now, u64::from(period), "rollover at t={t}");
            } else {
                assert_eq!(now, previous - 1, "countdown at t={t}");
            }
            previous = now;
        }
    }

    #[test]
    fn step_progress_spans_zero_to_one() {
        let at_start = step_progress(0, 30).expect("progress");
        let midway = step_progress(15, 30).expect("progress");
        let near_end = step_progress(29, 30).expect("progress");
        assert!(at_start.abs() < f64::EPSILON);
        assert!((midway - 0.5).abs() < f64::EPSILON);
        assert!(near_end > 0.9 && near_end < 1.0);
    }

    // ── Secret ingestion ────────────────────────────────────────────

    #[test]
    fn decode_secret_accepts_canonical_base32() {
        // "JBSWY3DPEHPK3PXP" is the classic "Hello!\xDE\xAD\xBE\xEF" test secret.
        let bytes = decode_secret("JBSWY3DPEHPK3PXP").expect("decode should succeed");
        assert_eq!(bytes, b"Hello!\xde\xad\xbe\xef");
    }

    #[test]
    fn decode_secret_tolerates_spacing_case_and_padding() {
        let canonical = decode_secret("JBSWY3DPEHPK3PXP").expect("decode");
        assert_eq!(decode_secret("jbsw y3dp ehpk 3pxp").expect("decode"), canonical);
        assert_eq!(decode_secret("JBSW-Y3DP-EHPK-3PXP").expect("decode"), canonical);
        assert_eq!(decode_secret("JBSWY3DPEHPK3PXP======").expect("decode"), canonical);
    }

    #[test]
    fn decode_secret_falls_back_to_base64() {
        let bytes = decode_secret("aGVsbG8gd29ybGQh").expect("decode should succeed");
        assert_eq!(bytes, b"hello world!");
    }

    #[test]
    fn decode_secret_rejects_garbage() {
        for bad in ["", "   ", "!!!not-an-encoding!!!", "01189998819991197253&"] {
            assert!(
                matches!(
                    decode_secret(bad),
                    Err(CryptoError::InvalidSecretEncoding(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn decode_secret_never_truncates() {
        // 10-byte secret through Base32 comes back as exactly 10 bytes.
        let encoded = data_encoding::BASE32_NOPAD.encode(b"0123456789");
        let bytes = decode_secret(&encoded).expect("decode should succeed");
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes, b"0123456789");
    }

    // ── Algorithm differentiation ───────────────────────────────────

    #[test]
    fn algorithms_produce_distinct_codes() {
        let secret = b"12345678901234567890123456789012345678901234567890123456789012345678";
        let time = 1_234_567_890u64;
        let sha1 =
            generate_totp(secret, time, OtpDigits::Six, 30, OtpAlgorithm::Sha1).expect("sha1");
        let sha256 =
            generate_totp(secret, time, OtpDigits::Six, 30, OtpAlgorithm::Sha256).expect("sha256");
        let sha512 =
            generate_totp(secret, time, OtpDigits::Six, 30, OtpAlgorithm::Sha512).expect("sha512");
        assert!(
            !(sha1 == sha256 && sha256 == sha512),
            "all three algorithms matching is vanishingly unlikely"
        );
    }
}
