// Entity Models
// "Identity persists, values change"
//
// - Bank: aggregate root, identity assigned by the store
// - Branch: owned child, matched across updates by its natural key (code)

pub mod bank;
pub mod branch;

pub use bank::{Bank, BankDraft, BankType, UnknownBankType, MAX_NAME_LENGTH};
pub use branch::{Branch, BranchDraft, MAX_ADDRESS_LENGTH, MAX_CODE_LENGTH, MAX_PHONE_LENGTH};
