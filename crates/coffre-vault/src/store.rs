//! SQLite-backed persistent store and the external store contract.
//!
//! The store holds bookkeeping columns and opaque sealed blobs — plaintext
//! never reaches it. [`ItemStore`] is the narrow contract sync adapters and
//! alternative backends implement; [`SqliteStore`] is the shipped
//! implementation, with embedded forward-only migrations and transactional
//! compound operations for everything that must be all-or-nothing
//! (question-set replacement, password-change re-encryption, selective
//! reset, import).

use std::fmt;
use std::path::Path;

use coffre_crypto_core::symmetric::SealedData;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::VaultError;
use crate::items::{ItemType, VaultItem};
use crate::lifecycle::{BiometricEscrow, MasterCredential};
use crate::questions::{QuestionRecord, RecoveryEscrow};

/// Forward-only SQL migrations, embedded at compile time.
/// Index 0 → version 1, index 1 → version 2, etc.
const MIGRATIONS: &[&str] = &[include_str!("../migrations/001_initial_schema.sql")];

// ---------------------------------------------------------------------------
// External store contract
// ---------------------------------------------------------------------------

/// The persistent-store operations the vault core requires.
///
/// Implementations only ever see sealed bytes; the core produces and
/// consumes the ciphertext on either side of this boundary.
pub trait ItemStore {
    /// Load a single item by id.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ItemNotFound`] for an unknown id.
    fn load_item(&self, id: &str) -> Result<VaultItem, VaultError>;

    /// Insert or replace an item.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    fn save_item(&self, item: &VaultItem) -> Result<(), VaultError>;

    /// Delete the given ids. Unknown ids are ignored; returns the number
    /// actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    fn delete_items(&self, ids: &[String]) -> Result<usize, VaultError>;

    /// All items of one type, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    fn list_items_by_type(&self, item_type: ItemType) -> Result<Vec<VaultItem>, VaultError>;
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Handle to an open vault database.
pub struct SqliteStore {
    conn: Connection,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SqliteStore(***)")
    }
}

impl SqliteStore {
    /// Open (or create) a vault database at `path` and run pending
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on open or migration failure.
    pub fn open(path: &Path) -> Result<Self, VaultError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory store (tests and previews).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on open or migration failure.
    pub fn open_in_memory() -> Result<Self, VaultError> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    /// Current schema version (`PRAGMA user_version`).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] if the pragma query fails.
    pub fn schema_version(&self) -> Result<i32, VaultError> {
        let v: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(v)
    }

    /// Apply all pending migrations sequentially, each in its own
    /// transaction with an atomic `user_version` bump.
    fn run_migrations(&mut self) -> Result<(), VaultError> {
        let current = self.schema_version()?;

        for (idx, sql) in MIGRATIONS.iter().enumerate() {
            // Migration versions are 1-indexed: index 0 → version 1.
            let version = idx
                .checked_add(1)
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| VaultError::Database("migration index overflow".into()))?;

            if version <= current {
                continue; // already applied
            }

            let tx = self.conn.transaction().map_err(|e| {
                VaultError::Database(format!(
                    "failed to start transaction for migration {version}: {e}"
                ))
            })?;
            tx.execute_batch(sql)
                .map_err(|e| VaultError::Database(format!("migration {version} failed: {e}")))?;
            tx.pragma_update(None, "user_version", version).map_err(|e| {
                VaultError::Database(format!("failed to update user_version to {version}: {e}"))
            })?;
            tx.commit().map_err(|e| {
                VaultError::Database(format!("failed to commit migration {version}: {e}"))
            })?;
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Master credential
    // -----------------------------------------------------------------------

    /// `true` once a master credential row exists.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on query failure.
    pub fn is_initialized(&self) -> Result<bool, VaultError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM master_credential", [], |row| {
                    row.get(0)
                })?;
        Ok(count > 0)
    }

    /// Insert or replace the single credential row.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn save_credential(&self, credential: &MasterCredential) -> Result<(), VaultError> {
        let kdf_params = serde_json::to_string(&credential.kdf_params)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO master_credential \
             (id, salt, verification_hash, verification_iterations, kdf_params, created_at, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                credential.salt.as_slice(),
                credential.verification_hash.as_slice(),
                credential.verification_iterations,
                kdf_params,
                credential.created_at,
                credential.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Load the credential row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn load_credential(&self) -> Result<Option<MasterCredential>, VaultError> {
        let row: Option<(Vec<u8>, Vec<u8>, u32, String, String, String)> = self
            .conn
            .query_row(
                "SELECT salt, verification_hash, verification_iterations, kdf_params, \
                 created_at, updated_at FROM master_credential WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((salt, hash, iterations, kdf_params, created_at, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(MasterCredential {
            salt: fixed_bytes(&salt, "credential salt")?,
            verification_hash: fixed_bytes(&hash, "verification hash")?,
            verification_iterations: iterations,
            kdf_params: serde_json::from_str(&kdf_params)?,
            created_at,
            updated_at,
        }))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Inherent version of [`ItemStore::save_item`].
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn save_item(&self, item: &VaultItem) -> Result<(), VaultError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO items (id, item_type, sealed, favorite, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id,
                item.item_type.as_db_str(),
                item.sealed.to_bytes(),
                i64::from(item.favorite),
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Inherent version of [`ItemStore::load_item`].
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ItemNotFound`] for an unknown id.
    pub fn load_item(&self, id: &str) -> Result<VaultItem, VaultError> {
        let row: Option<(String, Vec<u8>, i64, String, String)> = self
            .conn
            .query_row(
                "SELECT item_type, sealed, favorite, created_at, updated_at \
                 FROM items WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((item_type, sealed, favorite, created_at, updated_at)) = row else {
            return Err(VaultError::ItemNotFound(id.to_owned()));
        };
        Ok(VaultItem {
            id: id.to_owned(),
            item_type: ItemType::from_db_str(&item_type)?,
            sealed: SealedData::from_bytes(&sealed)?,
            favorite: favorite != 0,
            created_at,
            updated_at,
        })
    }

    /// Inherent version of [`ItemStore::delete_items`].
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn delete_items(&self, ids: &[String]) -> Result<usize, VaultError> {
        let mut removed = 0usize;
        for id in ids {
            let changed = self
                .conn
                .execute("DELETE FROM items WHERE id = ?1", params![id])?;
            removed = removed.saturating_add(changed);
        }
        Ok(removed)
    }

    /// Inherent version of [`ItemStore::list_items_by_type`].
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn list_items_by_type(&self, item_type: ItemType) -> Result<Vec<VaultItem>, VaultError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_type, sealed, favorite, created_at, updated_at \
             FROM items WHERE item_type = ?1 ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map(params![item_type.as_db_str()], item_from_row)?;
        collect_items(rows)
    }

    /// Every stored item, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn list_all_items(&self) -> Result<Vec<VaultItem>, VaultError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_type, sealed, favorite, created_at, updated_at \
             FROM items ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map([], item_from_row)?;
        collect_items(rows)
    }

    /// Count of items of one type.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on query failure.
    pub fn count_items_by_type(&self, item_type: ItemType) -> Result<u64, VaultError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE item_type = ?1",
            params![item_type.as_db_str()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // -----------------------------------------------------------------------
    // Security questions + recovery escrow
    // -----------------------------------------------------------------------

    /// Replace the configured question set and its recovery escrow in one
    /// transaction — never a mix of old and new records.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`];
    /// on any failure the prior set is left intact.
    pub fn replace_question_set(
        &mut self,
        records: &[QuestionRecord],
        escrow: &RecoveryEscrow,
    ) -> Result<(), VaultError> {
        let escrow_json = serde_json::to_string(escrow)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM security_questions", [])?;
        tx.execute("DELETE FROM recovery_escrow", [])?;
        for record in records {
            tx.execute(
                "INSERT INTO security_questions \
                 (question_id, answer_hash, answer_salt, iterations, position) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.question_id,
                    record.answer_hash.as_slice(),
                    record.answer_salt.as_slice(),
                    record.iterations,
                    record.position,
                ],
            )?;
        }
        tx.execute(
            "INSERT INTO recovery_escrow (id, escrow) VALUES (1, ?1)",
            params![escrow_json],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The configured question records, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on query failure.
    pub fn load_question_records(&self) -> Result<Vec<QuestionRecord>, VaultError> {
        let mut stmt = self.conn.prepare(
            "SELECT question_id, answer_hash, answer_salt, iterations, position \
             FROM security_questions ORDER BY position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u16>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u8>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (question_id, hash, salt, iterations, position) = row?;
            records.push(QuestionRecord {
                question_id,
                answer_hash: fixed_bytes(&hash, "answer hash")?,
                answer_salt: fixed_bytes(&salt, "answer salt")?,
                iterations,
                position,
            });
        }
        Ok(records)
    }

    /// The recovery escrow bundle, if questions are configured.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn load_recovery_escrow(&self) -> Result<Option<RecoveryEscrow>, VaultError> {
        load_escrow_row(&self.conn, "recovery_escrow")
    }

    /// Store (or replace) the recovery escrow bundle.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn save_recovery_escrow(&self, escrow: &RecoveryEscrow) -> Result<(), VaultError> {
        let json = serde_json::to_string(escrow)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO recovery_escrow (id, escrow) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Biometric escrow
    // -----------------------------------------------------------------------

    /// Store (or replace) the biometric escrow bundle.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn save_biometric_escrow(&self, escrow: &BiometricEscrow) -> Result<(), VaultError> {
        let json = serde_json::to_string(escrow)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO biometric_escrow (id, escrow) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    /// The biometric escrow bundle, if enrolled.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`].
    pub fn load_biometric_escrow(&self) -> Result<Option<BiometricEscrow>, VaultError> {
        load_escrow_row(&self.conn, "biometric_escrow")
    }

    /// Remove the biometric escrow (un-enroll).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn clear_biometric_escrow(&self) -> Result<(), VaultError> {
        self.conn.execute("DELETE FROM biometric_escrow", [])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Generator history
    // -----------------------------------------------------------------------

    /// Record one generated password (sealed).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn insert_history(
        &self,
        id: &str,
        sealed: &SealedData,
        created_at: &str,
    ) -> Result<(), VaultError> {
        self.conn.execute(
            "INSERT INTO generator_history (id, sealed, created_at) VALUES (?1, ?2, ?3)",
            params![id, sealed.to_bytes(), created_at],
        )?;
        Ok(())
    }

    /// All history rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on query failure.
    pub fn list_history(&self) -> Result<Vec<(String, SealedData, String)>, VaultError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sealed, created_at FROM generator_history ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (id, sealed, created_at) = row?;
            history.push((id, SealedData::from_bytes(&sealed)?, created_at));
        }
        Ok(history)
    }

    /// Delete every history row.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] on storage failure.
    pub fn clear_history(&self) -> Result<usize, VaultError> {
        let removed = self.conn.execute("DELETE FROM generator_history", [])?;
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Compound atomic operations
    // -----------------------------------------------------------------------

    /// Commit a password change: new credential, every re-sealed item and
    /// history row, and the re-wrapped escrows — one transaction, so a
    /// failure anywhere leaves the old key material fully in effect.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`];
    /// nothing is applied on failure.
    pub fn apply_password_change(
        &mut self,
        credential: &MasterCredential,
        resealed_items: &[(String, SealedData)],
        resealed_history: &[(String, SealedData)],
        biometric: Option<&BiometricEscrow>,
        recovery: Option<&RecoveryEscrow>,
    ) -> Result<(), VaultError> {
        let kdf_params = serde_json::to_string(&credential.kdf_params)?;
        let biometric_json = biometric.map(serde_json::to_string).transpose()?;
        let recovery_json = recovery.map(serde_json::to_string).transpose()?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE master_credential SET salt = ?1, verification_hash = ?2, \
             verification_iterations = ?3, kdf_params = ?4, updated_at = ?5 WHERE id = 1",
            params![
                credential.salt.as_slice(),
                credential.verification_hash.as_slice(),
                credential.verification_iterations,
                kdf_params,
                credential.updated_at,
            ],
        )?;
        for (id, sealed) in resealed_items {
            tx.execute(
                "UPDATE items SET sealed = ?1, updated_at = ?2 WHERE id = ?3",
                params![sealed.to_bytes(), credential.updated_at, id],
            )?;
        }
        for (id, sealed) in resealed_history {
            tx.execute(
                "UPDATE generator_history SET sealed = ?1 WHERE id = ?2",
                params![sealed.to_bytes(), id],
            )?;
        }
        tx.execute("DELETE FROM biometric_escrow", [])?;
        if let Some(json) = biometric_json {
            tx.execute(
                "INSERT INTO biometric_escrow (id, escrow) VALUES (1, ?1)",
                params![json],
            )?;
        }
        tx.execute("DELETE FROM recovery_escrow", [])?;
        if let Some(json) = recovery_json {
            tx.execute(
                "INSERT INTO recovery_escrow (id, escrow) VALUES (1, ?1)",
                params![json],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete whole item categories (plus, optionally, generator history)
    /// in one transaction. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`]; nothing is removed on failure.
    pub fn delete_categories(
        &mut self,
        item_types: &[ItemType],
        clear_history: bool,
    ) -> Result<usize, VaultError> {
        let tx = self.conn.transaction()?;
        let mut removed = 0usize;
        for item_type in item_types {
            let changed = tx.execute(
                "DELETE FROM items WHERE item_type = ?1",
                params![item_type.as_db_str()],
            )?;
            removed = removed.saturating_add(changed);
        }
        if clear_history {
            let changed = tx.execute("DELETE FROM generator_history", [])?;
            removed = removed.saturating_add(changed);
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Full wipe: items, history, questions, escrows, credential.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`]; nothing is removed on failure.
    pub fn wipe_all(&mut self) -> Result<(), VaultError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM items", [])?;
        tx.execute("DELETE FROM generator_history", [])?;
        tx.execute("DELETE FROM security_questions", [])?;
        tx.execute("DELETE FROM recovery_escrow", [])?;
        tx.execute("DELETE FROM biometric_escrow", [])?;
        tx.execute("DELETE FROM master_credential", [])?;
        tx.commit()?;
        Ok(())
    }

    /// Write an imported credential and item set in one transaction
    /// (fresh-device import).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] or [`VaultError::Serialization`];
    /// nothing is written on failure.
    pub fn import_snapshot(
        &mut self,
        credential: &MasterCredential,
        items: &[VaultItem],
    ) -> Result<(), VaultError> {
        let kdf_params = serde_json::to_string(&credential.kdf_params)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO master_credential \
             (id, salt, verification_hash, verification_iterations, kdf_params, created_at, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                credential.salt.as_slice(),
                credential.verification_hash.as_slice(),
                credential.verification_iterations,
                kdf_params,
                credential.created_at,
                credential.updated_at,
            ],
        )?;
        for item in items {
            tx.execute(
                "INSERT INTO items (id, item_type, sealed, favorite, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    item.id,
                    item.item_type.as_db_str(),
                    item.sealed.to_bytes(),
                    i64::from(item.favorite),
                    item.created_at,
                    item.updated_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl ItemStore for SqliteStore {
    fn load_item(&self, id: &str) -> Result<VaultItem, VaultError> {
        Self::load_item(self, id)
    }

    fn save_item(&self, item: &VaultItem) -> Result<(), VaultError> {
        Self::save_item(self, item)
    }

    fn delete_items(&self, ids: &[String]) -> Result<usize, VaultError> {
        Self::delete_items(self, ids)
    }

    fn list_items_by_type(&self, item_type: ItemType) -> Result<Vec<VaultItem>, VaultError> {
        Self::list_items_by_type(self, item_type)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

type ItemRow = (String, String, Vec<u8>, i64, String, String);

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn collect_items(
    rows: impl Iterator<Item = rusqlite::Result<ItemRow>>,
) -> Result<Vec<VaultItem>, VaultError> {
    let mut items = Vec::new();
    for row in rows {
        let (id, item_type, sealed, favorite, created_at, updated_at) = row?;
        items.push(VaultItem {
            id,
            item_type: ItemType::from_db_str(&item_type)?,
            sealed: SealedData::from_bytes(&sealed)?,
            favorite: favorite != 0,
            created_at,
            updated_at,
        });
    }
    Ok(items)
}

fn load_escrow_row<T: serde::de::DeserializeOwned>(
    conn: &Connection,
    table: &str,
) -> Result<Option<T>, VaultError> {
    let json: Option<String> = conn
        .query_row(
            &format!("SELECT escrow FROM {table} WHERE id = 1"),
            [],
            |row| row.get(0),
        )
        .optional()?;
    json.map(|j| serde_json::from_str(&j).map_err(VaultError::from))
        .transpose()
}

/// Convert a BLOB column into a fixed-size array, naming the column in the
/// error.
fn fixed_bytes<const N: usize>(bytes: &[u8], label: &str) -> Result<[u8; N], VaultError> {
    <[u8; N]>::try_from(bytes)
        .map_err(|_| VaultError::Database(format!("{label}: expected {N} bytes, got {}", bytes.len())))
}
