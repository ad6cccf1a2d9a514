// 🏢 Branch Entity - Child record owned by exactly one bank
//
// Natural key: `code` (unique across ALL branches, never modified once assigned)
// Mutable values: address, phone
//
// The owner is a plain foreign key value (`bank_id`), not a pointer back to
// the Bank, so the aggregate stays a tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a branch code (characters)
pub const MAX_CODE_LENGTH: usize = 4;

/// Maximum length of a branch address (characters)
pub const MAX_ADDRESS_LENGTH: usize = 200;

/// Maximum length of a branch phone (characters)
pub const MAX_PHONE_LENGTH: usize = 15;

// ============================================================================
// BRANCH DRAFT
// ============================================================================

/// A branch as described by a caller: natural key + mutable fields only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDraft {
    pub code: String,
    pub address: String,
    pub phone: String,
}

impl BranchDraft {
    pub fn new(
        code: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        BranchDraft {
            code: code.into(),
            address: address.into(),
            phone: phone.into(),
        }
    }
}

// ============================================================================
// BRANCH ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Store-assigned identity, None for a branch not inserted yet
    pub id: Option<Uuid>,

    /// Natural key
    pub code: String,

    pub address: String,
    pub phone: String,

    /// Owning bank (foreign key only)
    pub bank_id: Option<Uuid>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Branch {
    /// New branch with no identity yet
    pub fn from_draft(draft: BranchDraft, bank_id: Option<Uuid>) -> Self {
        Branch {
            id: None,
            code: draft.code,
            address: draft.address,
            phone: draft.phone,
            bank_id,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Overwrite the mutable fields from a draft.
    ///
    /// Identity, code, owner and timestamps are left alone.
    /// Returns true when address or phone actually changed.
    pub fn apply(&mut self, draft: &BranchDraft) -> bool {
        let changed = self.address != draft.address || self.phone != draft.phone;

        self.address.clone_from(&draft.address);
        self.phone.clone_from(&draft.phone);

        changed
    }
}
