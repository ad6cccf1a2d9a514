// Banks API - Core Library
// Bank aggregate (bank + owned branches), reconciled by branch code on update.
// Exposes all modules for use in the server binary and tests.

pub mod api;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod error;
pub mod logging;
pub mod mirror;
pub mod reconciliation;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use api::{router, AppState};
pub use config::{Config, ConfigError, LogFormat};
pub use db::{setup_database, BankStore};
pub use dto::{
    BankRequest, BankResponse, BranchRequest, BranchResponse, ErrorResponse, FieldError,
    HealthResponse, ValidationErrorResponse,
};
pub use entities::{Bank, BankDraft, BankType, Branch, BranchDraft};
pub use error::{BankError, ConflictCause, ErrorKind};
pub use mirror::RemoteMirror;
pub use reconciliation::{AggregateReconciler, ReconciliationReport};
pub use service::BankService;
pub use validation::validate_bank_request;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
