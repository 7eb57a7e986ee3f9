//! `coffre-vault` — Vault business logic for COFFRE.
//!
//! Master credential lifecycle, item storage, multi-factor identity
//! verification, session management, recovery questions, selective reset,
//! and the encrypted export/import pair for sync backends.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod config;
pub mod error;
pub mod store;

pub mod items;

pub mod session;

pub mod identity;

pub mod lifecycle;

pub mod questions;

pub mod reset;

pub mod generator;

pub mod transfer;

pub use config::VaultConfig;
pub use error::VaultError;
pub use generator::{clear_history, generate_and_record, list_history, GeneratedEntry};
pub use identity::{BiometricOutcome, IdentityVerifier, VerifyState};
pub use items::{
    add_item, get_payload, open_payload, seal_payload, set_favorite, update_item, ItemPayload,
    ItemType, TotpSecret, VaultItem,
};
pub use lifecycle::{
    change_master_password, enroll_biometric, has_biometric, initialize, remove_biometric,
    vault_fingerprint, BiometricEscrow, MasterCredential,
};
pub use questions::{
    configure, configured_question_ids, question_text, QuestionAnswer, QuestionRecord,
    RecoveryEscrow, QUESTION_CATALOG, QUESTION_SET_SIZE,
};
pub use reset::{reset_selected_data, wipe, ResetReport, ResetSelection};
pub use session::SessionManager;
pub use store::{ItemStore, SqliteStore};
pub use transfer::{
    export_encrypted_blob, import_encrypted_blob, BlobHeader, ImportReport, FORMAT_VERSION, MAGIC,
};
