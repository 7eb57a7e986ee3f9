//! Security questions — catalog, configuration, and answer-based recovery.
//!
//! Three questions are configured as a full set. Each answer is normalized
//! (trim + Unicode lowercase) and stored only as a salted PBKDF2 hash. For
//! recovery to actually unlock the vault, a random 256-bit recovery key is
//! wrapped once per unordered question pair under an Argon2id derivation of
//! that pair's normalized answers — so any two correct answers rebuild a
//! wrapping key, unwrap the recovery key, and open the escrowed session
//! key. Neither the answers nor any key is ever stored in the clear.
//!
//! ```text
//! answers (i, j) ──Argon2id──► pair wrapping key ──► unwraps ──► recovery key
//! recovery key ──► opens escrow ──► session key
//! ```

use coffre_crypto_core::kdf::{self, KdfParams, SALT_LEN};
use coffre_crypto_core::memory::SecretBytes;
use coffre_crypto_core::slots::{self, KeySlot, SlotPurpose};
use coffre_crypto_core::symmetric::{self, SealedData};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::session::SessionManager;
use crate::store::SqliteStore;

/// Number of questions in a configured set.
pub const QUESTION_SET_SIZE: usize = 3;

/// AAD for the session key sealed under the recovery key.
const RECOVERY_SESSION_AAD: &[u8] = b"coffre-escrow-recovery-session";

/// AAD for the recovery key sealed under the session key.
const RECOVERY_KEY_AAD: &[u8] = b"coffre-escrow-recovery-key";

/// Separator between the two normalized answers of a pair.
const PAIR_SEPARATOR: u8 = 0x1F;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The predefined question catalog. Ids are stable across releases; texts
/// are display strings, not secrets.
pub const QUESTION_CATALOG: &[(u16, &str)] = &[
    (1, "What was the name of your first pet?"),
    (2, "In which city were you born?"),
    (3, "What was the name of your primary school?"),
    (4, "What is your mother's maiden name?"),
    (5, "What was the make of your first car?"),
    (6, "What is the name of the street you grew up on?"),
    (7, "What was your childhood nickname?"),
    (8, "Where did you go on your first holiday abroad?"),
    (9, "What was the title of the first album you bought?"),
    (10, "What is the first name of your oldest cousin?"),
];

/// Look up a catalog question's display text.
#[must_use]
pub fn question_text(question_id: u16) -> Option<&'static str> {
    QUESTION_CATALOG
        .iter()
        .find(|(id, _)| *id == question_id)
        .map(|(_, text)| *text)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One question/answer pair submitted during setup.
#[derive(Debug, Clone)]
pub struct QuestionAnswer {
    /// Catalog question id.
    pub question_id: u16,
    /// The user's answer (raw; normalized internally).
    pub answer: String,
}

impl Drop for QuestionAnswer {
    fn drop(&mut self) {
        self.answer.zeroize();
    }
}

/// A stored question record — hash and salt only.
#[derive(Debug, Clone)]
pub struct QuestionRecord {
    /// Catalog question id.
    pub question_id: u16,
    /// PBKDF2 hash of the normalized answer.
    pub answer_hash: [u8; 32],
    /// Per-question random salt.
    pub answer_salt: [u8; SALT_LEN],
    /// PBKDF2 iteration count the hash was computed with.
    pub iterations: u32,
    /// Position within the configured set (0..3).
    pub position: u8,
}

/// The recovery key wrapped under one question pair's answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSlot {
    /// Lower question id of the pair.
    pub question_a: u16,
    /// Higher question id of the pair.
    pub question_b: u16,
    /// Salt for the pair's Argon2id derivation.
    pub salt: [u8; SALT_LEN],
    /// The recovery key wrapped under the pair wrapping key.
    pub slot: KeySlot,
}

/// Everything recovery needs beyond the hashes: the pair slots and the
/// two-way escrow between recovery key and session key.
///
/// `session_under_recovery` is re-sealed on password change (the session
/// key changes); the pair slots are not (the recovery key does not).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryEscrow {
    /// Argon2id parameters the pair slots were derived with.
    pub kdf_params: KdfParams,
    /// One slot per unordered question pair (three total).
    pub pairs: Vec<PairSlot>,
    /// The session key sealed under the recovery key.
    pub session_under_recovery: SealedData,
    /// The recovery key sealed under the session key.
    pub recovery_under_session: SealedData,
}

impl RecoveryEscrow {
    /// Open the escrowed session key with an unwrapped recovery key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` (wrapped) on a wrong or stale
    /// recovery key.
    pub(crate) fn recover_session_key(
        &self,
        recovery_key: &[u8],
    ) -> Result<SecretBytes<32>, VaultError> {
        let opened =
            symmetric::decrypt(&self.session_under_recovery, recovery_key, RECOVERY_SESSION_AAD)?;
        Ok(SecretBytes::from_slice(opened.expose())?)
    }

    /// Re-seal the escrow for a new session key. The pair slots carry over
    /// untouched; only the two escrow seals change.
    ///
    /// # Errors
    ///
    /// Fails if `old_session_key` cannot open the stored recovery key.
    pub(crate) fn reseal(
        &self,
        old_session_key: &SecretBytes<32>,
        new_session_key: &SecretBytes<32>,
    ) -> Result<Self, VaultError> {
        let recovery_key = symmetric::decrypt(
            &self.recovery_under_session,
            old_session_key.expose(),
            RECOVERY_KEY_AAD,
        )?;
        Ok(Self {
            kdf_params: self.kdf_params.clone(),
            pairs: self.pairs.clone(),
            session_under_recovery: symmetric::encrypt(
                new_session_key.expose(),
                recovery_key.expose(),
                RECOVERY_SESSION_AAD,
            )?,
            recovery_under_session: symmetric::encrypt(
                recovery_key.expose(),
                new_session_key.expose(),
                RECOVERY_KEY_AAD,
            )?,
        })
    }
}

// ---------------------------------------------------------------------------
// Normalization and hashing
// ---------------------------------------------------------------------------

/// Normalize an answer: trim surrounding whitespace, Unicode lowercase.
#[must_use]
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Constant-time check of one answer against its stored record.
pub(crate) fn verify_answer(record: &QuestionRecord, answer: &str) -> Result<bool, VaultError> {
    let mut normalized = normalize_answer(answer);
    let ok = kdf::verify_against_hash(
        normalized.as_bytes(),
        &record.answer_salt,
        record.iterations,
        &record.answer_hash,
    )?;
    normalized.zeroize();
    Ok(ok)
}

/// Build the pair derivation input: both normalized answers in ascending
/// question-id order, separated by a unit byte.
fn pair_material(a: (u16, &str), b: (u16, &str)) -> Vec<u8> {
    let ((_, first), (_, second)) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    let mut material = Vec::with_capacity(
        first.len().saturating_add(second.len()).saturating_add(1),
    );
    material.extend_from_slice(first.as_bytes());
    material.push(PAIR_SEPARATOR);
    material.extend_from_slice(second.as_bytes());
    material
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configure (or replace) the question set.
///
/// Validation pre-empts persistence: duplicate ids, blank answers, and
/// ids outside the catalog are rejected before anything is written. On
/// success the three records and the recovery escrow replace any prior
/// set in one transaction.
///
/// Requires an unlocked session — the escrow wraps the current key.
///
/// # Errors
///
/// - [`VaultError::DuplicateQuestion`] / [`VaultError::IncompleteAnswer`] /
///   [`VaultError::UnknownQuestion`] for invalid input
/// - [`VaultError::NotUnlocked`] while locked
pub fn configure(
    store: &mut SqliteStore,
    session: &SessionManager,
    config: &VaultConfig,
    answers: &[QuestionAnswer; QUESTION_SET_SIZE],
) -> Result<(), VaultError> {
    // Validate the set before touching key material or storage.
    for (idx, qa) in answers.iter().enumerate() {
        if question_text(qa.question_id).is_none() {
            return Err(VaultError::UnknownQuestion(qa.question_id));
        }
        if normalize_answer(&qa.answer).is_empty() {
            return Err(VaultError::IncompleteAnswer(qa.question_id));
        }
        if answers
            .iter()
            .skip(idx.saturating_add(1))
            .any(|other| other.question_id == qa.question_id)
        {
            return Err(VaultError::DuplicateQuestion(qa.question_id));
        }
    }

    let session_key = session.current_key()?;
    let recovery_key = SecretBytes::<32>::random()?;

    // Hash records, in submission order.
    let mut records = Vec::with_capacity(QUESTION_SET_SIZE);
    for (position, qa) in answers.iter().enumerate() {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut normalized = normalize_answer(&qa.answer);
        let answer_hash = kdf::hash_for_verification(
            normalized.as_bytes(),
            &salt,
            config.verification_iterations,
        )?;
        normalized.zeroize();
        records.push(QuestionRecord {
            question_id: qa.question_id,
            answer_hash,
            answer_salt: salt,
            iterations: config.verification_iterations,
            position: u8::try_from(position).unwrap_or(u8::MAX),
        });
    }

    // One pair slot per unordered question pair.
    let mut pairs = Vec::with_capacity(QUESTION_SET_SIZE);
    for i in 0..answers.len() {
        for j in i.saturating_add(1)..answers.len() {
            let a = &answers[i];
            let b = &answers[j];
            let norm_a = normalize_answer(&a.answer);
            let norm_b = normalize_answer(&b.answer);
            let mut material =
                pair_material((a.question_id, &norm_a), (b.question_id, &norm_b));

            let mut salt = [0u8; SALT_LEN];
            OsRng.fill_bytes(&mut salt);
            let wrapping = kdf::derive(&material, &salt, &config.kdf_params)?;
            material.zeroize();

            let slot = slots::wrap_key(
                recovery_key.expose(),
                wrapping.expose(),
                SlotPurpose::RecoveryPair,
            )?;
            let (question_a, question_b) = if a.question_id <= b.question_id {
                (a.question_id, b.question_id)
            } else {
                (b.question_id, a.question_id)
            };
            pairs.push(PairSlot {
                question_a,
                question_b,
                salt,
                slot,
            });
        }
    }

    let escrow = RecoveryEscrow {
        kdf_params: config.kdf_params.clone(),
        pairs,
        session_under_recovery: symmetric::encrypt(
            session_key.expose(),
            recovery_key.expose(),
            RECOVERY_SESSION_AAD,
        )?,
        recovery_under_session: symmetric::encrypt(
            recovery_key.expose(),
            session_key.expose(),
            RECOVERY_KEY_AAD,
        )?,
    };

    store.replace_question_set(&records, &escrow)
}

/// Ids of the configured questions, in configuration order.
///
/// # Errors
///
/// Returns [`VaultError::Database`] on query failure.
pub fn configured_question_ids(store: &SqliteStore) -> Result<Vec<u16>, VaultError> {
    Ok(store
        .load_question_records()?
        .iter()
        .map(|r| r.question_id)
        .collect())
}

/// Recover the session key from two correct answers.
///
/// The caller has already hash-verified the answers; this derives the pair
/// wrapping key, unwraps the recovery key, and opens the escrow.
///
/// # Errors
///
/// - [`VaultError::QuestionsNotConfigured`] if no escrow exists or the
///   pair has no slot
/// - `CryptoError::Decryption` (wrapped) if an answer is wrong
pub fn recover_session_key(
    store: &SqliteStore,
    first: (u16, &str),
    second: (u16, &str),
) -> Result<SecretBytes<32>, VaultError> {
    let escrow = store
        .load_recovery_escrow()?
        .ok_or(VaultError::QuestionsNotConfigured)?;

    let (lo, hi) = if first.0 <= second.0 {
        (first, second)
    } else {
        (second, first)
    };
    let pair = escrow
        .pairs
        .iter()
        .find(|p| p.question_a == lo.0 && p.question_b == hi.0)
        .ok_or(VaultError::QuestionsNotConfigured)?;

    let norm_lo = normalize_answer(lo.1);
    let norm_hi = normalize_answer(hi.1);
    let mut material = pair_material((lo.0, &norm_lo), (hi.0, &norm_hi));
    let wrapping = kdf::derive(&material, &pair.salt, &escrow.kdf_params)?;
    material.zeroize();

    let recovery_key = slots::unwrap_key(&pair.slot, wrapping.expose())?;
    escrow.recover_session_key(recovery_key.expose())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
