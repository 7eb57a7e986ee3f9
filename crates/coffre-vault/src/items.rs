//! Vault items — typed payloads, AEAD sealing, and CRUD operations.
//!
//! An item row carries plaintext bookkeeping (id, type tag, timestamps,
//! favorite flag) and one sealed blob. The blob is the JSON encoding of an
//! [`ItemPayload`] variant encrypted under the session key with the item
//! type as AAD, so a record can never be opened as a different type than
//! it was sealed as. Decrypted payloads live in transient memory only and
//! zeroize their secret fields on drop.

use coffre_crypto_core::memory::SecretBytes;
use coffre_crypto_core::symmetric::{self, SealedData};
use coffre_crypto_core::totp::{self, OtpAlgorithm, OtpDigits};
use coffre_crypto_core::CryptoError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::VaultError;
use crate::lifecycle::{generate_uuid, now_iso8601};
use crate::session::SessionManager;
use crate::store::SqliteStore;

// ---------------------------------------------------------------------------
// Item type
// ---------------------------------------------------------------------------

/// The closed set of item kinds the vault stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Site or app credential (username + password).
    Password,
    /// TOTP shared secret and parameters.
    Totp,
    /// Free-form encrypted note.
    Note,
    /// Identity document (passport, licence, ID card).
    Document,
    /// Payment card.
    Card,
    /// WebAuthn passkey.
    Passkey,
}

impl ItemType {
    /// All item types, in display order.
    pub const ALL: [Self; 6] = [
        Self::Password,
        Self::Totp,
        Self::Note,
        Self::Document,
        Self::Card,
        Self::Passkey,
    ];

    /// The `snake_case` string stored in the `items.item_type` column.
    #[must_use]
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Totp => "totp",
            Self::Note => "note",
            Self::Document => "document",
            Self::Card => "card",
            Self::Passkey => "passkey",
        }
    }

    /// Parse from the database `TEXT` value.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Database`] for unknown type strings.
    pub fn from_db_str(s: &str) -> Result<Self, VaultError> {
        match s {
            "password" => Ok(Self::Password),
            "totp" => Ok(Self::Totp),
            "note" => Ok(Self::Note),
            "document" => Ok(Self::Document),
            "card" => Ok(Self::Card),
            "passkey" => Ok(Self::Passkey),
            other => Err(VaultError::Database(format!("unknown item_type: {other}"))),
        }
    }

    /// AAD tag binding a sealed payload to its type.
    #[must_use]
    pub const fn aad_tag(self) -> &'static [u8] {
        match self {
            Self::Password => b"coffre-item-password",
            Self::Totp => b"coffre-item-totp",
            Self::Note => b"coffre-item-note",
            Self::Document => b"coffre-item-document",
            Self::Card => b"coffre-item-card",
            Self::Passkey => b"coffre-item-passkey",
        }
    }
}

// ---------------------------------------------------------------------------
// TOTP secret
// ---------------------------------------------------------------------------

/// A stored TOTP secret with its generation parameters.
///
/// Constructed only through [`TotpSecret::new`] or
/// [`TotpSecret::from_encoded`], which enforce the invariants
/// `period > 0` and digits ∈ {6, 8}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpSecret {
    /// Raw shared secret bytes (decoded, never re-padded).
    pub key: Vec<u8>,
    /// HMAC algorithm.
    pub algorithm: OtpAlgorithm,
    /// Code length.
    pub digits: OtpDigits,
    /// Time step in seconds.
    pub period: u32,
    /// HOTP counter, if the provider is counter-based.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<u64>,
}

impl TotpSecret {
    /// Build a secret from raw bytes, validating the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Otp`] if the key is empty or `period` is 0.
    pub fn new(
        key: Vec<u8>,
        algorithm: OtpAlgorithm,
        digits: OtpDigits,
        period: u32,
        counter: Option<u64>,
    ) -> Result<Self, CryptoError> {
        if key.is_empty() {
            return Err(CryptoError::Otp("secret must not be empty".into()));
        }
        if period == 0 {
            return Err(CryptoError::Otp("period must be > 0".into()));
        }
        Ok(Self {
            key,
            algorithm,
            digits,
            period,
            counter,
        })
    }

    /// Build a secret from its textual (Base32/Base64) form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSecretEncoding`] if the text decodes
    /// under neither alphabet, or [`CryptoError::Otp`] for bad parameters.
    pub fn from_encoded(
        text: &str,
        algorithm: OtpAlgorithm,
        digits: OtpDigits,
        period: u32,
        counter: Option<u64>,
    ) -> Result<Self, CryptoError> {
        let key = totp::decode_secret(text)?;
        Self::new(key, algorithm, digits, period, counter)
    }

    /// Generate the code for the given Unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Otp`] on generation failure.
    pub fn code_at(&self, time: u64) -> Result<String, CryptoError> {
        totp::generate_totp(&self.key, time, self.digits, self.period, self.algorithm)
    }

    /// Seconds until the code for `time` rolls over.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Otp`] on a zero period (unreachable for a
    /// validated secret).
    pub fn time_remaining(&self, time: u64) -> Result<u64, CryptoError> {
        totp::time_remaining(time, self.period)
    }
}

impl Drop for TotpSecret {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// The decrypted, type-specific content of an item.
///
/// Serialized to JSON and sealed under the session key; the variant tag in
/// the JSON matches the plaintext `item_type` column, and the AAD check
/// makes a mismatch unopenable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemPayload {
    /// Site or app credential.
    Password {
        /// Username or email.
        username: String,
        /// The password.
        password: String,
        /// Primary URL, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        /// Free-form notes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// TOTP secret and parameters.
    Totp {
        /// The shared secret and generation parameters.
        secret: TotpSecret,
        /// Issuer label (e.g. "github.com").
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
    },
    /// Free-form encrypted note.
    Note {
        /// Note body.
        body: String,
        /// Search tags.
        #[serde(default)]
        tags: Vec<String>,
    },
    /// Identity document.
    Document {
        /// Document kind (passport, licence, ...).
        doc_kind: String,
        /// Document number.
        number: String,
        /// Holder name as printed.
        holder: String,
        /// Expiry date (ISO 8601), if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<String>,
        /// Free-form notes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// Payment card.
    Card {
        /// Card number (PAN).
        number: String,
        /// Holder name as embossed.
        holder: String,
        /// Expiry in MM/YY form.
        expiry: String,
        /// Card verification value.
        cvv: String,
        /// Issuing bank label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer_bank: Option<String>,
        /// Free-form notes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// WebAuthn passkey.
    Passkey {
        /// Relying party id (e.g. "example.com").
        relying_party: String,
        /// User handle at the relying party.
        user_handle: String,
        /// Credential id (Base64).
        credential_id: String,
        /// PKCS#8 private key (Base64).
        private_key: String,
    },
}

impl ItemPayload {
    /// The [`ItemType`] this payload belongs to.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Password { .. } => ItemType::Password,
            Self::Totp { .. } => ItemType::Totp,
            Self::Note { .. } => ItemType::Note,
            Self::Document { .. } => ItemType::Document,
            Self::Card { .. } => ItemType::Card,
            Self::Passkey { .. } => ItemType::Passkey,
        }
    }
}

/// Zeroize secret fields when a decrypted payload leaves scope.
///
/// Serde necessarily creates intermediate `String`s that cannot be
/// zeroized; this covers the primary in-memory lifetime of the payload,
/// which may span function calls.
impl Drop for ItemPayload {
    fn drop(&mut self) {
        match self {
            Self::Password {
                username,
                password,
                url,
                notes,
            } => {
                username.zeroize();
                password.zeroize();
                if let Some(u) = url {
                    u.zeroize();
                }
                if let Some(n) = notes {
                    n.zeroize();
                }
            }
            // TotpSecret zeroizes its own key on drop.
            Self::Totp { secret: _, issuer } => {
                if let Some(i) = issuer {
                    i.zeroize();
                }
            }
            Self::Note { body, tags } => {
                body.zeroize();
                for tag in tags.iter_mut() {
                    tag.zeroize();
                }
            }
            Self::Document {
                doc_kind: _,
                number,
                holder,
                expires_at: _,
                notes,
            } => {
                number.zeroize();
                holder.zeroize();
                if let Some(n) = notes {
                    n.zeroize();
                }
            }
            Self::Card {
                number,
                holder,
                expiry,
                cvv,
                issuer_bank: _,
                notes,
            } => {
                number.zeroize();
                holder.zeroize();
                expiry.zeroize();
                cvv.zeroize();
                if let Some(n) = notes {
                    n.zeroize();
                }
            }
            Self::Passkey {
                relying_party: _,
                user_handle,
                credential_id,
                private_key,
            } => {
                user_handle.zeroize();
                credential_id.zeroize();
                private_key.zeroize();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Item record
// ---------------------------------------------------------------------------

/// A stored item — plaintext bookkeeping plus one sealed payload blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultItem {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Payload type discriminator.
    pub item_type: ItemType,
    /// The AEAD-sealed payload.
    pub sealed: SealedData,
    /// Pinned for quick access.
    pub favorite: bool,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// Seal / open
// ---------------------------------------------------------------------------

/// Seal a payload under the session key.
///
/// # Errors
///
/// Returns [`VaultError::Serialization`] or a crypto error from the seal.
pub fn seal_payload(payload: &ItemPayload, key: &SecretBytes<32>) -> Result<SealedData, VaultError> {
    let mut plaintext = serde_json::to_vec(payload)?;
    let sealed = symmetric::encrypt(&plaintext, key.expose(), payload.item_type().aad_tag());
    plaintext.zeroize();
    Ok(sealed?)
}

/// Open a sealed payload, authenticating it against its item type.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` (via [`VaultError::Crypto`]) for any
/// authentication failure, or [`VaultError::Serialization`] if the
/// decrypted bytes are not a valid payload.
pub fn open_payload(
    item_type: ItemType,
    sealed: &SealedData,
    key: &SecretBytes<32>,
) -> Result<ItemPayload, VaultError> {
    let plaintext = symmetric::decrypt(sealed, key.expose(), item_type.aad_tag())?;
    let payload: ItemPayload = serde_json::from_slice(plaintext.expose())?;
    Ok(payload)
}

// ---------------------------------------------------------------------------
// CRUD operations
// ---------------------------------------------------------------------------

/// Seal and persist a new item. Returns the stored record.
///
/// # Errors
///
/// Returns [`VaultError::NotUnlocked`] when the vault is locked.
pub fn add_item(
    store: &SqliteStore,
    session: &SessionManager,
    payload: &ItemPayload,
    favorite: bool,
) -> Result<VaultItem, VaultError> {
    let sealed = session.with_key(|key| seal_payload(payload, key))?;
    let now = now_iso8601();
    let item = VaultItem {
        id: generate_uuid(),
        item_type: payload.item_type(),
        sealed,
        favorite,
        created_at: now.clone(),
        updated_at: now,
    };
    store.save_item(&item)?;
    Ok(item)
}

/// Load an item and open its payload into transient memory.
///
/// # Errors
///
/// Returns [`VaultError::ItemNotFound`], [`VaultError::NotUnlocked`], or a
/// decryption failure.
pub fn get_payload(
    store: &SqliteStore,
    session: &SessionManager,
    id: &str,
) -> Result<ItemPayload, VaultError> {
    let item = store.load_item(id)?;
    session.with_key(|key| open_payload(item.item_type, &item.sealed, key))
}

/// Replace an item's payload, preserving id and creation time.
///
/// The replacement payload must be the same type as the stored item —
/// items never change type in place.
///
/// # Errors
///
/// Returns [`VaultError::Database`] on a type mismatch, plus the usual
/// locked/not-found failures.
pub fn update_item(
    store: &SqliteStore,
    session: &SessionManager,
    id: &str,
    payload: &ItemPayload,
) -> Result<VaultItem, VaultError> {
    let mut item = store.load_item(id)?;
    if item.item_type != payload.item_type() {
        return Err(VaultError::Database(format!(
            "item {id} is {}, cannot overwrite with {}",
            item.item_type.as_db_str(),
            payload.item_type().as_db_str()
        )));
    }
    item.sealed = session.with_key(|key| seal_payload(payload, key))?;
    item.updated_at = now_iso8601();
    store.save_item(&item)?;
    Ok(item)
}

/// Toggle the favorite flag. Metadata-only — no key required.
///
/// # Errors
///
/// Returns [`VaultError::ItemNotFound`] for an unknown id.
pub fn set_favorite(store: &SqliteStore, id: &str, favorite: bool) -> Result<(), VaultError> {
    let mut item = store.load_item(id)?;
    item.favorite = favorite;
    item.updated_at = now_iso8601();
    store.save_item(&item)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
