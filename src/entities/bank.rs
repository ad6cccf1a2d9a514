// 🏦 Bank Entity - Parent aggregate that owns its branches
//
// "Bank id is IDENTITY (assigned once by the store), name/type/branches are VALUES"
//
// - A bank exclusively owns its branches; a branch never moves between banks
// - Branches are matched by their natural key (code), never by id, on update
// - Deleting a bank deletes all of its branches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::branch::{Branch, BranchDraft};

/// Maximum length of a bank name (characters)
pub const MAX_NAME_LENGTH: usize = 100;

// ============================================================================
// BANK TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankType {
    /// State-owned bank
    Public,

    /// Privately held bank
    Private,
}

impl BankType {
    /// Every accepted value, in declaration order
    pub const ALL: [BankType; 2] = [BankType::Public, BankType::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            BankType::Public => "PUBLIC",
            BankType::Private => "PRIVATE",
        }
    }

    /// Comma separated list of accepted values, e.g. "PUBLIC, PRIVATE"
    pub fn accepted_values() -> String {
        Self::ALL
            .iter()
            .map(BankType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for BankType: {0}")]
pub struct UnknownBankType(pub String);

impl FromStr for BankType {
    type Err = UnknownBankType;

    /// Exact, case-sensitive match on the wire name
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bank_type| bank_type.as_str() == value)
            .ok_or_else(|| UnknownBankType(value.to_string()))
    }
}

// ============================================================================
// BANK DRAFT (caller-supplied shape, no identity)
// ============================================================================

/// The target shape of a bank as proposed by a caller.
///
/// Used both to create a bank and as the proposed side of a reconciliation.
/// Branches carry only their natural key and mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankDraft {
    pub name: String,
    pub bank_type: BankType,
    pub branches: Vec<BranchDraft>,
}

impl BankDraft {
    pub fn new(name: impl Into<String>, bank_type: BankType, branches: Vec<BranchDraft>) -> Self {
        BankDraft {
            name: name.into(),
            bank_type,
            branches,
        }
    }

    /// Distinct branch codes of this draft
    pub fn codes(&self) -> BTreeSet<&str> {
        self.branches.iter().map(|b| b.code.as_str()).collect()
    }
}

// ============================================================================
// BANK ENTITY
// ============================================================================

/// Bank aggregate root
///
/// Identity: `id` (None until the store has inserted it)
/// Values: name, type, branches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    // ========================================================================
    // IDENTITY (assigned by the store, never changes)
    // ========================================================================
    pub id: Option<Uuid>,

    // ========================================================================
    // VALUES
    // ========================================================================
    /// Unique across all banks
    pub name: String,

    pub bank_type: BankType,

    /// Owned branches, order irrelevant
    pub branches: Vec<Branch>,

    // ========================================================================
    // TIMESTAMPS (assigned by the store)
    // ========================================================================
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bank {
    /// Build a bank that has not been persisted yet.
    ///
    /// Every branch is new: no id, owner set once the store assigns the bank id.
    pub fn from_draft(draft: BankDraft) -> Self {
        Bank {
            id: None,
            name: draft.name,
            bank_type: draft.bank_type,
            branches: draft
                .branches
                .into_iter()
                .map(|branch| Branch::from_draft(branch, None))
                .collect(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Has the store assigned an identity yet?
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Find an owned branch by its natural key
    pub fn branch(&self, code: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.code == code)
    }

    /// Distinct branch codes currently owned
    pub fn codes(&self) -> BTreeSet<&str> {
        self.branches.iter().map(|b| b.code.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BankDraft {
        BankDraft::new(
            "Bank 1",
            BankType::Public,
            vec![
                BranchDraft::new("0001", "Address 1", "Phone 1"),
                BranchDraft::new("0002", "Address 2", "Phone 2"),
            ],
        )
    }

    #[test]
    fn test_bank_from_draft() {
        let bank = Bank::from_draft(draft());

        assert!(!bank.is_persisted());
        assert_eq!(bank.name, "Bank 1");
        assert_eq!(bank.bank_type, BankType::Public);
        assert_eq!(bank.branches.len(), 2);
        assert!(bank.branches.iter().all(|b| b.id.is_none() && b.bank_id.is_none()));
        assert!(bank.created_at.is_none());
    }

    #[test]
    fn test_bank_branch_lookup() {
        let bank = Bank::from_draft(draft());

        assert_eq!(bank.branch("0002").map(|b| b.address.as_str()), Some("Address 2"));
        assert!(bank.branch("9999").is_none());
        assert_eq!(bank.codes().into_iter().collect::<Vec<_>>(), vec!["0001", "0002"]);
    }

    #[test]
    fn test_bank_type_parse() {
        assert_eq!("PUBLIC".parse::<BankType>(), Ok(BankType::Public));
        assert_eq!("PRIVATE".parse::<BankType>(), Ok(BankType::Private));

        // Case-sensitive, like the wire format
        assert!("public".parse::<BankType>().is_err());
        assert_eq!(
            "INVALID_VALUE".parse::<BankType>().unwrap_err().to_string(),
            "Invalid value for BankType: INVALID_VALUE"
        );
    }

    #[test]
    fn test_bank_type_serde() {
        assert_eq!(serde_json::to_string(&BankType::Private).unwrap(), "\"PRIVATE\"");
        assert_eq!(BankType::accepted_values(), "PUBLIC, PRIVATE");
    }
}
