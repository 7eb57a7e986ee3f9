//! Selective data reset and full wipe.
//!
//! Both operations are gated on an unlocked session and run as single
//! storage transactions: either every selected category is gone or none
//! is, and unselected categories are untouched either way.

use crate::error::VaultError;
use crate::items::ItemType;
use crate::session::SessionManager;
use crate::store::SqliteStore;

/// Which data categories a reset removes.
///
/// Notes and passkeys have no reset flag — they go only with a full
/// [`wipe`].
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSelection {
    /// Delete all password items.
    pub passwords: bool,
    /// Delete all TOTP items.
    pub totp: bool,
    /// Delete all document items.
    pub documents: bool,
    /// Delete all card items.
    pub cards: bool,
    /// Clear the password-generator history.
    pub generator_history: bool,
}

impl ResetSelection {
    /// Select every resettable category.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            passwords: true,
            totp: true,
            documents: true,
            cards: true,
            generator_history: true,
        }
    }

    /// `true` if nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.passwords || self.totp || self.documents || self.cards || self.generator_history)
    }

    fn item_types(self) -> Vec<ItemType> {
        let mut types = Vec::new();
        if self.passwords {
            types.push(ItemType::Password);
        }
        if self.totp {
            types.push(ItemType::Totp);
        }
        if self.documents {
            types.push(ItemType::Document);
        }
        if self.cards {
            types.push(ItemType::Card);
        }
        types
    }
}

/// Outcome of a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    /// Total rows removed across the selected categories.
    pub rows_removed: usize,
}

/// Delete the selected categories as an atomic set.
///
/// # Errors
///
/// - [`VaultError::NotAuthorized`] while locked
/// - [`VaultError::Database`] on storage failure — in which case nothing
///   was deleted
pub fn reset_selected_data(
    store: &mut SqliteStore,
    session: &SessionManager,
    selection: ResetSelection,
) -> Result<ResetReport, VaultError> {
    if !session.is_unlocked() {
        return Err(VaultError::NotAuthorized);
    }
    if selection.is_empty() {
        return Ok(ResetReport { rows_removed: 0 });
    }
    let rows_removed =
        store.delete_categories(&selection.item_types(), selection.generator_history)?;
    Ok(ResetReport { rows_removed })
}

/// Full wipe: every item, the generator history, the question set, both
/// escrows, and the master credential. Locks the session afterwards.
///
/// # Errors
///
/// - [`VaultError::NotAuthorized`] while locked
/// - [`VaultError::Database`] on storage failure — nothing removed, the
///   session stays unlocked
pub fn wipe(store: &mut SqliteStore, session: &SessionManager) -> Result<(), VaultError> {
    if !session.is_unlocked() {
        return Err(VaultError::NotAuthorized);
    }
    store.wipe_all()?;
    session.lock();
    Ok(())
}
