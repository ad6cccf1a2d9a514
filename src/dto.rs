// 📦 Wire shapes - request, response and error bodies
//
// Requests are loose: every field optional, type as a raw string.
// Missing and unknown values are reported by validation, per field.

use crate::entities::{Bank, BankType, Branch, BranchDraft};
use crate::error::BankError;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================================================
// REQUESTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BankRequest {
    #[serde(default)]
    #[validate(
        required(message = "Name is required"),
        custom(function = "not_blank", message = "Name is required"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: Option<String>,

    /// Parsed separately: an unknown value is a format error, not a field error
    #[serde(default, rename = "type")]
    pub bank_type: Option<String>,

    /// Items are validated one by one so errors carry their index
    #[serde(default)]
    #[validate(
        required(message = "The branches are required"),
        length(min = 1, message = "The branches are required")
    )]
    pub branches: Option<Vec<BranchRequest>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct BranchRequest {
    #[serde(default)]
    #[validate(
        required(message = "Code is required"),
        custom(function = "not_blank", message = "Code is required"),
        length(max = 4, message = "Code cannot exceed 4 characters")
    )]
    pub code: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "Address is required"),
        custom(function = "not_blank", message = "Address is required"),
        length(max = 200, message = "Address cannot exceed 200 characters")
    )]
    pub address: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "Phone is required"),
        custom(function = "not_blank", message = "Phone is required"),
        length(max = 15, message = "Phone cannot exceed 15 characters")
    )]
    pub phone: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl BankRequest {
    pub fn new(name: &str, bank_type: &str, branches: Vec<BranchRequest>) -> Self {
        BankRequest {
            name: Some(name.to_string()),
            bank_type: Some(bank_type.to_string()),
            branches: Some(branches),
        }
    }
}

impl BranchRequest {
    pub fn new(code: &str, address: &str, phone: &str) -> Self {
        BranchRequest {
            code: Some(code.to_string()),
            address: Some(address.to_string()),
            phone: Some(phone.to_string()),
        }
    }

    /// The draft this request describes, None while any field is missing
    pub fn into_draft(self) -> Option<BranchDraft> {
        match (self.code, self.address, self.phone) {
            (Some(code), Some(address), Some(phone)) => Some(BranchDraft::new(code, address, phone)),
            _ => None,
        }
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub bank_type: BankType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub branches: Vec<BranchResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    pub id: Uuid,
    pub code: String,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<Bank> for BankResponse {
    type Error = BankError;

    /// Only banks read back from (or just written to) the store have ids;
    /// anything else is a bug, never a nil id on the wire.
    fn try_from(bank: Bank) -> Result<Self, Self::Error> {
        let id = bank
            .id
            .ok_or_else(|| BankError::Internal(anyhow!("bank '{}' has no id", bank.name)))?;

        let mut branches = bank
            .branches
            .into_iter()
            .map(BranchResponse::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        branches.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(Self {
            id,
            name: bank.name,
            bank_type: bank.bank_type,
            created_at: bank.created_at,
            updated_at: bank.updated_at,
            branches,
        })
    }
}

impl TryFrom<Branch> for BranchResponse {
    type Error = BankError;

    fn try_from(branch: Branch) -> Result<Self, Self::Error> {
        let id = branch
            .id
            .ok_or_else(|| BankError::Internal(anyhow!("branch '{}' has no id", branch.code)))?;

        Ok(Self {
            id,
            code: branch.code,
            address: branch.address,
            phone: branch.phone,
            created_at: branch.created_at,
            updated_at: branch.updated_at,
        })
    }
}

/// GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub message: String,
    pub errors: Vec<FieldError>,
}
