//! Multi-factor identity verification.
//!
//! One [`IdentityVerifier`] value is one verification flow:
//!
//! ```text
//! Unverified ──(master password)──► Unlocked
//! Unverified ──(two security answers)──► Unlocked
//! Unverified ──(biometric assertion)──► Unlocked
//! Unverified ──(3 failed answer attempts)──► Locked   (terminal)
//! ```
//!
//! `Locked` is terminal for the flow only — drop the verifier and begin a
//! new one to try again. Abandoning a flow mid-way has no side effects;
//! the attempt counter lives inside the flow and dies with it. On any
//! success the session is unlocked exactly once, always with a key that
//! came out of a derivation — no path hands over stored key material
//! directly.

use rand::rngs::OsRng;
use rand::Rng;
use zeroize::Zeroize;

use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::questions::{self, QuestionRecord};
use crate::session::SessionManager;
use crate::store::SqliteStore;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Flow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    /// No factor has succeeded yet.
    Unverified,
    /// A factor succeeded; the session is unlocked.
    Unlocked,
    /// The answer-attempt cap was reached; the flow is dead.
    Locked,
}

/// Result of the external biometric capability, consumed by the core.
///
/// The platform prompt, its callbacks, and its retries all stay outside;
/// the core sees one value per assertion.
#[derive(Debug)]
pub enum BiometricOutcome {
    /// The platform verified the user and released the keychain token.
    Authenticated {
        /// The stored deriving secret from the OS keychain.
        token: Vec<u8>,
    },
    /// The user failed or cancelled the prompt.
    Failed,
    /// The capability itself errored (no sensor, hardware fault).
    Unavailable(String),
}

impl Drop for BiometricOutcome {
    fn drop(&mut self) {
        if let Self::Authenticated { token } = self {
            token.zeroize();
        }
    }
}

/// A single verification flow over one vault.
pub struct IdentityVerifier<'a> {
    store: &'a SqliteStore,
    session: &'a SessionManager,
    config: &'a VaultConfig,
    state: VerifyState,
    attempts: u8,
    challenge: Option<[u16; 2]>,
}

impl std::fmt::Debug for IdentityVerifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl<'a> IdentityVerifier<'a> {
    /// Begin a fresh verification flow with a zeroed attempt counter.
    #[must_use]
    pub const fn begin(
        store: &'a SqliteStore,
        session: &'a SessionManager,
        config: &'a VaultConfig,
    ) -> Self {
        Self {
            store,
            session,
            config,
            state: VerifyState::Unverified,
            attempts: 0,
            challenge: None,
        }
    }

    /// Current flow state.
    #[must_use]
    pub const fn state(&self) -> VerifyState {
        self.state
    }

    /// Answer attempts consumed in this flow.
    #[must_use]
    pub const fn attempts(&self) -> u8 {
        self.attempts
    }

    // -----------------------------------------------------------------------
    // Master password
    // -----------------------------------------------------------------------

    /// Check the master password; on a match, derive the session key and
    /// unlock. The input is never logged or echoed into errors.
    ///
    /// A wrong password is `Ok(false)` — the password path has no attempt
    /// counter; lockout belongs to the security-question path alone.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManyAttempts`] in a dead flow
    /// - [`VaultError::NotInitialized`] before first-run setup
    pub fn verify_master_password(&mut self, input: &str) -> Result<bool, VaultError> {
        self.check_flow_alive()?;
        if self.state == VerifyState::Unlocked {
            return Ok(true);
        }

        let credential = self
            .store
            .load_credential()?
            .ok_or(VaultError::NotInitialized)?;
        if !credential.verify(input)? {
            return Ok(false);
        }

        let key = credential.derive_session_key(input)?;
        self.finish_unlock(key);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Security questions
    // -----------------------------------------------------------------------

    /// Draw the two questions this flow will challenge.
    ///
    /// Two distinct questions are picked from the configured three via the
    /// CSPRNG. The pair is stable for the rest of the flow.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManyAttempts`] in a dead flow
    /// - [`VaultError::QuestionsNotConfigured`] with no configured set
    pub fn question_challenge(&mut self) -> Result<[u16; 2], VaultError> {
        self.check_flow_alive()?;
        if let Some(pair) = self.challenge {
            return Ok(pair);
        }

        let records = self.store.load_question_records()?;
        if records.len() < questions::QUESTION_SET_SIZE {
            return Err(VaultError::QuestionsNotConfigured);
        }

        let mut rng = OsRng;
        let first = rng.gen_range(0..records.len());
        let mut second = rng.gen_range(0..records.len().saturating_sub(1));
        if second >= first {
            second = second.saturating_add(1);
        }
        let pair = [records[first].question_id, records[second].question_id];
        self.challenge = Some(pair);
        Ok(pair)
    }

    /// Check both challenged answers; on a match, recover the session key
    /// through the pair escrow and unlock.
    ///
    /// Any failure increments the flow's attempt counter. The third
    /// failure transitions to `Locked` and surfaces
    /// [`VaultError::TooManyAttempts`]; so does every later call on this
    /// flow.
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManyAttempts`] on and after the final failure
    /// - [`VaultError::QuestionsNotConfigured`] with no configured set
    pub fn verify_security_answers(
        &mut self,
        answer_a: &str,
        answer_b: &str,
    ) -> Result<bool, VaultError> {
        self.check_flow_alive()?;
        if self.state == VerifyState::Unlocked {
            return Ok(true);
        }

        let [id_a, id_b] = self.question_challenge()?;
        let records = self.store.load_question_records()?;
        let record_a = find_record(&records, id_a)?;
        let record_b = find_record(&records, id_b)?;

        // Both comparisons always run — no early exit on the first miss.
        let ok_a = questions::verify_answer(record_a, answer_a)?;
        let ok_b = questions::verify_answer(record_b, answer_b)?;

        if !(ok_a && ok_b) {
            return self.record_failed_attempt();
        }

        let key = questions::recover_session_key(self.store, (id_a, answer_a), (id_b, answer_b))?;
        self.finish_unlock(key);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Biometric
    // -----------------------------------------------------------------------

    /// Consume a biometric assertion result.
    ///
    /// Success is treated identically to a password match: the released
    /// token is run through HKDF and the escrow chain to produce the
    /// session key — derivation is never bypassed. `Failed` leaves the
    /// flow untouched (`Ok(false)`).
    ///
    /// # Errors
    ///
    /// - [`VaultError::TooManyAttempts`] in a dead flow
    /// - [`VaultError::BiometricNotEnrolled`] with no escrow
    /// - [`VaultError::BiometricUnavailable`] for a capability error
    pub fn verify_biometric(&mut self, outcome: &BiometricOutcome) -> Result<bool, VaultError> {
        self.check_flow_alive()?;
        if self.state == VerifyState::Unlocked {
            return Ok(true);
        }

        let token = match outcome {
            BiometricOutcome::Authenticated { token } => token,
            BiometricOutcome::Failed => return Ok(false),
            BiometricOutcome::Unavailable(reason) => {
                return Err(VaultError::BiometricUnavailable(reason.clone()));
            }
        };

        let escrow = self
            .store
            .load_biometric_escrow()?
            .ok_or(VaultError::BiometricNotEnrolled)?;
        let key = escrow.unlock_session_key(token)?;
        self.finish_unlock(key);
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_flow_alive(&self) -> Result<(), VaultError> {
        if self.state == VerifyState::Locked {
            return Err(VaultError::TooManyAttempts);
        }
        Ok(())
    }

    fn record_failed_attempt(&mut self) -> Result<bool, VaultError> {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= self.config.max_answer_attempts {
            self.state = VerifyState::Locked;
            return Err(VaultError::TooManyAttempts);
        }
        Ok(false)
    }

    /// The one place `unlock` is called — each flow reaches it at most once.
    fn finish_unlock(&mut self, key: coffre_crypto_core::memory::SecretBytes<32>) {
        self.session.unlock(key);
        self.state = VerifyState::Unlocked;
    }
}

fn find_record<'r>(
    records: &'r [QuestionRecord],
    question_id: u16,
) -> Result<&'r QuestionRecord, VaultError> {
    records
        .iter()
        .find(|r| r.question_id == question_id)
        .ok_or(VaultError::QuestionsNotConfigured)
}
