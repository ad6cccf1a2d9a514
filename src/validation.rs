// ✅ Request validation - turn a loose BankRequest into a BankDraft
//
// Runs before any store access. Two failure shapes:
// - malformed `type` value      → InvalidFormat (the value cannot be read at all)
// - missing/blank/too long/dup  → Validation with every field error collected
//
// Field rules live on the request types (`validator` derive); this module
// runs them, walks the branches by index and adds the cross-branch rule
// (codes unique within one request).

use crate::dto::{BankRequest, FieldError};
use crate::entities::{BankDraft, BankType};
use crate::error::BankError;
use std::collections::HashSet;
use validator::{Validate, ValidationErrors};

/// Reported fields, in the order errors are listed
const BANK_FIELDS: [&str; 1] = ["name"];
const BRANCHES_FIELD: &str = "branches";
const BRANCH_FIELDS: [&str; 3] = ["code", "address", "phone"];

/// Validate a create/update request and build the draft it describes
pub fn validate_bank_request(request: BankRequest) -> Result<BankDraft, BankError> {
    // Unknown enum values are a format problem, reported on their own
    let bank_type = request
        .bank_type
        .as_deref()
        .map(parse_bank_type)
        .transpose()?;

    let outcome = request.validate();

    let mut errors = Vec::new();
    if let Err(found) = &outcome {
        collect_field_errors(found, "", &BANK_FIELDS, &mut errors);
    }

    if bank_type.is_none() {
        errors.push(FieldError::new("type", "Type is required"));
    }

    if let Err(found) = &outcome {
        collect_field_errors(found, "", &[BRANCHES_FIELD], &mut errors);
    }

    let mut branches = Vec::new();
    for (index, branch) in request.branches.unwrap_or_default().into_iter().enumerate() {
        match branch.validate() {
            Ok(()) => {
                if let Some(draft) = branch.into_draft() {
                    branches.push((index, draft));
                }
            }
            Err(found) => {
                let prefix = format!("{}[{}].", BRANCHES_FIELD, index);
                collect_field_errors(&found, &prefix, &BRANCH_FIELDS, &mut errors);
            }
        }
    }

    // Codes must be unique within one request
    let mut seen = HashSet::new();
    for (index, draft) in &branches {
        if !seen.insert(draft.code.as_str()) {
            errors.push(FieldError::new(
                format!("{}[{}].code", BRANCHES_FIELD, index),
                "Duplicate branch code in request",
            ));
        }
    }

    match (request.name, bank_type) {
        (Some(name), Some(bank_type)) if errors.is_empty() => Ok(BankDraft::new(
            name,
            bank_type,
            branches.into_iter().map(|(_, draft)| draft).collect(),
        )),
        _ => Err(BankError::Validation(errors)),
    }
}

/// Parse the wire name of a bank type
pub fn parse_bank_type(value: &str) -> Result<BankType, BankError> {
    value.parse::<BankType>().map_err(|_| {
        BankError::invalid_format(
            format!("Invalid value for field type: {}", value),
            format!("Field type must be one of [{}]", BankType::accepted_values()),
        )
    })
}

/// First error of each listed field, as `{prefix}{field}`
fn collect_field_errors(
    found: &ValidationErrors,
    prefix: &str,
    fields: &[&str],
    errors: &mut Vec<FieldError>,
) {
    let by_field = found.field_errors();

    for field in fields {
        let Some(first) = by_field.get(*field).and_then(|list| list.first()) else {
            continue;
        };

        let message = first
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid value ({})", first.code));

        errors.push(FieldError::new(format!("{}{}", prefix, field), message));
    }
}
