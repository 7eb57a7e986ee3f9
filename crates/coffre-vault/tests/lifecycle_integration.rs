#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for credential lifecycle — setup, password change
//! with atomic re-encryption, escrow survival.

use coffre_crypto_core::kdf::{KdfParams, MIN_M_COST, MIN_VERIFICATION_ITERATIONS};
use coffre_crypto_core::totp::{OtpAlgorithm, OtpDigits};
use coffre_vault::error::VaultError;
use coffre_vault::identity::{BiometricOutcome, IdentityVerifier};
use coffre_vault::items::{self, ItemPayload, TotpSecret};
use coffre_vault::questions::{self, QuestionAnswer};
use coffre_vault::session::SessionManager;
use coffre_vault::store::SqliteStore;
use coffre_vault::{generator, lifecycle, VaultConfig};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn test_config() -> VaultConfig {
    VaultConfig {
        kdf_params: KdfParams {
            m_cost: MIN_M_COST,
            t_cost: 1,
            p_cost: 1,
        },
        verification_iterations: MIN_VERIFICATION_ITERATIONS,
        max_answer_attempts: 3,
    }
}

fn setup_unlocked(secret: &str) -> (SqliteStore, SessionManager, VaultConfig) {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    let config = test_config();
    lifecycle::initialize(&store, &config, secret).expect("initialize");
    let session = SessionManager::new();
    {
        let mut verifier = IdentityVerifier::begin(&store, &session, &config);
        assert!(verifier.verify_master_password(secret).expect("verify"));
    }
    (store, session, config)
}

fn add_password_item(store: &SqliteStore, session: &SessionManager, name: &str) -> String {
    let payload = ItemPayload::Password {
        username: name.to_owned(),
        password: format!("{name}-secret"),
        url: None,
        notes: None,
    };
    items::add_item(store, session, &payload, false)
        .expect("add item")
        .id
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn initialize_then_unlock_roundtrip() {
    let store = SqliteStore::open_in_memory().expect("store");
    let config = test_config();
    lifecycle::initialize(&store, &config, "first secret").expect("initialize");
    assert!(store.is_initialized().expect("is_initialized"));

    let session = SessionManager::new();
    let mut verifier = IdentityVerifier::begin(&store, &session, &config);
    assert!(verifier.verify_master_password("first secret").expect("verify"));
}

#[test]
fn initialize_twice_is_rejected() {
    let store = SqliteStore::open_in_memory().expect("store");
    let config = test_config();
    lifecycle::initialize(&store, &config, "first secret").expect("initialize");
    assert!(matches!(
        lifecycle::initialize(&store, &config, "other secret"),
        Err(VaultError::AlreadyInitialized)
    ));
}

#[test]
fn initialize_rejects_weak_kdf_params() {
    let store = SqliteStore::open_in_memory().expect("store");
    let mut config = test_config();
    config.kdf_params.m_cost = 64; // far below the floor
    let result = lifecycle::initialize(&store, &config, "secret");
    assert!(matches!(
        result,
        Err(VaultError::Crypto(
            coffre_crypto_core::CryptoError::WeakParameters(_)
        ))
    ));
    assert!(!store.is_initialized().expect("is_initialized"));
}

#[test]
fn initialize_rejects_weak_verification_iterations() {
    let store = SqliteStore::open_in_memory().expect("store");
    let mut config = test_config();
    config.verification_iterations = 10_000;
    assert!(lifecycle::initialize(&store, &config, "secret").is_err());
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

#[test]
fn password_change_swaps_verification_and_keeps_items() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let item_id = add_password_item(&store, &session, "github");

    let totp_payload = ItemPayload::Totp {
        secret: TotpSecret::from_encoded(
            "JBSWY3DPEHPK3PXP",
            OtpAlgorithm::Sha1,
            OtpDigits::Six,
            30,
            None,
        )
        .expect("secret"),
        issuer: Some("example.com".into()),
    };
    let totp_id = items::add_item(&store, &session, &totp_payload, true)
        .expect("add totp")
        .id;

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");

    // Old secret no longer verifies; new one does.
    {
        session.lock();
        let mut verifier = IdentityVerifier::begin(&store, &session, &config);
        assert!(!verifier.verify_master_password("secret A").expect("verify"));
        assert!(verifier.verify_master_password("secret B").expect("verify"));
    }

    // Every stored item decrypts under the new session key.
    let opened = items::get_payload(&store, &session, &item_id).expect("open item");
    match &opened {
        ItemPayload::Password { username, password, .. } => {
            assert_eq!(username, "github");
            assert_eq!(password, "github-secret");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    let opened = items::get_payload(&store, &session, &totp_id).expect("open totp");
    match &opened {
        ItemPayload::Totp { secret, .. } => {
            assert_eq!(secret.code_at(59).expect("code").len(), 6);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn password_change_requires_correct_old_secret() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let item_id = add_password_item(&store, &session, "github");

    assert!(matches!(
        lifecycle::change_master_password(&mut store, &session, &config, "wrong", "secret B"),
        Err(VaultError::InvalidPassword)
    ));

    // Prior state fully intact: old secret still works, item still opens.
    session.lock();
    let mut verifier = IdentityVerifier::begin(&store, &session, &config);
    assert!(verifier.verify_master_password("secret A").expect("verify"));
    items::get_payload(&store, &session, &item_id).expect("item still opens");
}

#[test]
fn password_change_keeps_session_unlocked_under_new_key() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let item_id = add_password_item(&store, &session, "gitlab");

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");

    // No re-unlock needed — the session key was swapped in place.
    assert!(session.is_unlocked());
    items::get_payload(&store, &session, &item_id).expect("item opens under new key");
}

#[test]
fn password_change_while_locked_leaves_session_locked() {
    let (mut store, session, config) = setup_unlocked("secret A");
    add_password_item(&store, &session, "github");
    session.lock();

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");
    assert!(!session.is_unlocked());
}

#[test]
fn password_change_reencrypts_generator_history() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let generated = generator::generate_and_record(
        &store,
        &session,
        20,
        &coffre_crypto_core::CharsetConfig::default(),
    )
    .expect("generate");

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");

    let history = generator::list_history(&store, &session).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].password, generated);
}

#[test]
fn biometric_enrollment_survives_password_change() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let token = vec![0xA5u8; 32];
    lifecycle::enroll_biometric(&store, &session, &token).expect("enroll");

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");
    session.lock();

    let mut verifier = IdentityVerifier::begin(&store, &session, &config);
    let outcome = BiometricOutcome::Authenticated { token };
    assert!(verifier.verify_biometric(&outcome).expect("verify"));
    assert!(session.is_unlocked());
}

#[test]
fn recovery_questions_survive_password_change() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let answers = [
        QuestionAnswer {
            question_id: 1,
            answer: "Fluffy".into(),
        },
        QuestionAnswer {
            question_id: 2,
            answer: "Lyon".into(),
        },
        QuestionAnswer {
            question_id: 3,
            answer: "Jules Ferry".into(),
        },
    ];
    questions::configure(&mut store, &session, &config, &answers).expect("configure");

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");
    session.lock();

    let mut verifier = IdentityVerifier::begin(&store, &session, &config);
    let [id_a, id_b] = verifier.question_challenge().expect("challenge");
    let answer = |id: u16| match id {
        1 => "Fluffy",
        2 => "Lyon",
        3 => "Jules Ferry",
        _ => panic!("unexpected id {id}"),
    };
    assert!(verifier
        .verify_security_answers(answer(id_a), answer(id_b))
        .expect("verify answers"));
    assert!(session.is_unlocked());
}

#[test]
fn password_change_on_uninitialized_vault_fails() {
    let mut store = SqliteStore::open_in_memory().expect("store");
    let session = SessionManager::new();
    let config = test_config();
    assert!(matches!(
        lifecycle::change_master_password(&mut store, &session, &config, "a", "b"),
        Err(VaultError::NotInitialized)
    ));
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

#[test]
fn fingerprint_is_stable_until_credential_changes() {
    let (mut store, session, config) = setup_unlocked("secret A");
    let first = lifecycle::vault_fingerprint(&store).expect("fingerprint");
    let again = lifecycle::vault_fingerprint(&store).expect("fingerprint");
    assert_eq!(first, again);
    assert_eq!(first.len(), 19, "XXXX-XXXX-XXXX-XXXX");

    lifecycle::change_master_password(&mut store, &session, &config, "secret A", "secret B")
        .expect("password change");
    let after = lifecycle::vault_fingerprint(&store).expect("fingerprint");
    assert_ne!(first, after, "new credential, new sync identity");
}

#[test]
fn fingerprint_requires_initialized_vault() {
    let store = SqliteStore::open_in_memory().expect("store");
    assert!(matches!(
        lifecycle::vault_fingerprint(&store),
        Err(VaultError::NotInitialized)
    ));
}
