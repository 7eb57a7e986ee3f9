//! Encrypted export/import blob for sync backends.
//!
//! The blob is what WebDAV/KeePass/Bitwarden adapters move between
//! devices; transport and conflict merge stay outside the core. It never
//! contains plaintext: the body is the item set with each payload still
//! sealed under the session key, and the header carries exactly the
//! credential metadata a peer needs to re-derive that key from the master
//! secret (salt, KDF parameters, verification hash).
//!
//! # Blob Layout
//!
//! ```text
//! Magic "CFRE" (4 B) | Version (1 B) | Header Len (u32 LE) | Header JSON
//!                    | Body Len (u32 LE) | Body JSON
//! ```

use coffre_crypto_core::kdf::{KdfParams, SALT_LEN};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::items::VaultItem;
use crate::lifecycle::{fingerprint_credential, now_iso8601, MasterCredential};
use crate::session::SessionManager;
use crate::store::SqliteStore;

/// Magic bytes identifying a COFFRE export blob.
pub const MAGIC: &[u8; 4] = b"CFRE";

/// Current blob format version.
pub const FORMAT_VERSION: u8 = 1;

/// Length of a u32 length prefix.
const LEN_PREFIX: usize = 4;

/// Minimum blob size: magic + version + two length prefixes.
const MIN_BLOB_SIZE: usize = 4 + 1 + LEN_PREFIX + LEN_PREFIX;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Unencrypted blob header — credential metadata only, no user data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobHeader {
    /// Blob format version.
    pub version: u8,
    /// Vault fingerprint (sync identity).
    pub fingerprint: String,
    /// Credential salt.
    pub salt: Vec<u8>,
    /// PBKDF2 verification hash.
    pub verification_hash: Vec<u8>,
    /// PBKDF2 iteration count.
    pub verification_iterations: u32,
    /// Argon2id parameters for session-key derivation.
    pub kdf_params: KdfParams,
    /// Number of items in the body.
    pub item_count: u32,
    /// ISO 8601 export timestamp.
    pub exported_at: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Items written to the store.
    pub items_imported: usize,
    /// Fingerprint of the imported credential.
    pub fingerprint: String,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Serialize the vault into an export blob.
///
/// Requires an unlocked session — exporting is an outward-facing bulk
/// operation even though no plaintext leaves the store.
///
/// # Errors
///
/// - [`VaultError::NotAuthorized`] while locked
/// - [`VaultError::NotInitialized`] with no credential
pub fn export_encrypted_blob(
    store: &SqliteStore,
    session: &SessionManager,
) -> Result<Vec<u8>, VaultError> {
    if !session.is_unlocked() {
        return Err(VaultError::NotAuthorized);
    }
    let credential = store.load_credential()?.ok_or(VaultError::NotInitialized)?;
    let items = store.list_all_items()?;

    let header = BlobHeader {
        version: FORMAT_VERSION,
        fingerprint: fingerprint_credential(&credential),
        salt: credential.salt.to_vec(),
        verification_hash: credential.verification_hash.to_vec(),
        verification_iterations: credential.verification_iterations,
        kdf_params: credential.kdf_params.clone(),
        item_count: u32::try_from(items.len())
            .map_err(|_| VaultError::BlobFormat("item count exceeds u32".into()))?,
        exported_at: now_iso8601(),
    };

    let header_json = serde_json::to_vec(&header)?;
    let body_json = serde_json::to_vec(&items)?;

    let header_len = u32::try_from(header_json.len())
        .map_err(|_| VaultError::BlobFormat("header too large".into()))?;
    let body_len = u32::try_from(body_json.len())
        .map_err(|_| VaultError::BlobFormat("body too large".into()))?;

    let mut blob = Vec::with_capacity(
        MIN_BLOB_SIZE
            .saturating_add(header_json.len())
            .saturating_add(body_json.len()),
    );
    blob.extend_from_slice(MAGIC);
    blob.push(FORMAT_VERSION);
    blob.extend_from_slice(&header_len.to_le_bytes());
    blob.extend_from_slice(&header_json);
    blob.extend_from_slice(&body_len.to_le_bytes());
    blob.extend_from_slice(&body_json);
    Ok(blob)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import an export blob into an uninitialized store (fresh device).
///
/// Writes the credential metadata and every item in one transaction. The
/// vault stays locked afterwards — unlocking requires the master secret,
/// which re-derives the same session key via the imported salt and
/// parameters. Escrows (biometric, recovery) do not travel; those paths
/// are re-enrolled per device.
///
/// # Errors
///
/// - [`VaultError::BlobFormat`] for bad magic, version, or framing
/// - [`VaultError::AlreadyInitialized`] if a credential exists here
pub fn import_encrypted_blob(
    store: &mut SqliteStore,
    blob: &[u8],
) -> Result<ImportReport, VaultError> {
    let (header, items) = parse_blob(blob)?;

    if store.is_initialized()? {
        return Err(VaultError::AlreadyInitialized);
    }

    let salt: [u8; SALT_LEN] = header
        .salt
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::BlobFormat("salt has wrong length".into()))?;
    let verification_hash: [u8; 32] = header
        .verification_hash
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::BlobFormat("verification hash has wrong length".into()))?;

    let now = now_iso8601();
    let credential = MasterCredential {
        salt,
        verification_hash,
        verification_iterations: header.verification_iterations,
        kdf_params: header.kdf_params.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    store.import_snapshot(&credential, &items)?;
    Ok(ImportReport {
        items_imported: items.len(),
        fingerprint: header.fingerprint,
    })
}

/// Validate framing and parse header + body.
fn parse_blob(blob: &[u8]) -> Result<(BlobHeader, Vec<VaultItem>), VaultError> {
    if blob.len() < MIN_BLOB_SIZE {
        return Err(VaultError::BlobFormat("blob too short".into()));
    }
    if &blob[..4] != MAGIC {
        return Err(VaultError::BlobFormat("bad magic bytes".into()));
    }
    let version = blob[4];
    if version != FORMAT_VERSION {
        return Err(VaultError::BlobFormat(format!(
            "unsupported blob version {version} (expected {FORMAT_VERSION})"
        )));
    }

    let mut cursor = 5usize;
    let header_bytes = read_chunk(blob, &mut cursor, "header")?;
    let header: BlobHeader = serde_json::from_slice(header_bytes)?;
    if header.version != version {
        return Err(VaultError::BlobFormat(
            "header version disagrees with frame version".into(),
        ));
    }

    let body_bytes = read_chunk(blob, &mut cursor, "body")?;
    let items: Vec<VaultItem> = serde_json::from_slice(body_bytes)?;

    if items.len() != usize::try_from(header.item_count).unwrap_or(usize::MAX) {
        return Err(VaultError::BlobFormat(format!(
            "item count mismatch: header says {}, body has {}",
            header.item_count,
            items.len()
        )));
    }
    Ok((header, items))
}

/// Read one `u32 LE length || bytes` chunk at `cursor`.
fn read_chunk<'b>(
    blob: &'b [u8],
    cursor: &mut usize,
    label: &str,
) -> Result<&'b [u8], VaultError> {
    let len_end = cursor
        .checked_add(LEN_PREFIX)
        .ok_or_else(|| VaultError::BlobFormat(format!("{label} length overflow")))?;
    let len_bytes = blob
        .get(*cursor..len_end)
        .ok_or_else(|| VaultError::BlobFormat(format!("truncated {label} length")))?;
    let len = u32::from_le_bytes(
        len_bytes
            .try_into()
            .map_err(|_| VaultError::BlobFormat(format!("bad {label} length")))?,
    ) as usize;

    let data_end = len_end
        .checked_add(len)
        .ok_or_else(|| VaultError::BlobFormat(format!("{label} length overflow")))?;
    let data = blob
        .get(len_end..data_end)
        .ok_or_else(|| VaultError::BlobFormat(format!("truncated {label}")))?;
    *cursor = data_end;
    Ok(data)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
