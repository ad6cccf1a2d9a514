// 🗄️ Store - SQLite persistence for the bank aggregate
//
// - banks.name and branches.code are UNIQUE (branch codes system-wide)
// - branches.bank_id → banks.id ON DELETE CASCADE
// - ids are UUID v4 assigned here, timestamps RFC 3339 UTC
//
// Saving a bank writes the whole aggregate in one transaction:
// orphans deleted, claimed branches updated, new branches inserted.

use crate::entities::{Bank, BankType, Branch};
use crate::error::{BankError, ConflictCause};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for crash recovery, FK enforcement for the cascade
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Banks Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS banks (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Branches Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS branches (
            id TEXT PRIMARY KEY NOT NULL,
            code TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            bank_id TEXT NOT NULL REFERENCES banks(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_banks_name ON banks(name)",
        [],
    )?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_branches_code ON branches(code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_branches_bank ON branches(bank_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CONSTRAINT CLASSIFICATION
// ============================================================================

impl From<rusqlite::Error> for BankError {
    /// Unique violations become conflicts naming the broken rule,
    /// everything else is internal.
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                if message.contains("banks.name") {
                    return BankError::Conflict(ConflictCause::BankName);
                }
                if message.contains("branches.code") {
                    return BankError::Conflict(ConflictCause::BranchCode);
                }
            }
        }

        BankError::Internal(anyhow::Error::new(err).context("Database error"))
    }
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_bank_type(idx: usize, value: String) -> rusqlite::Result<BankType> {
    value
        .parse::<BankType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bank_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bank> {
    Ok(Bank {
        id: Some(parse_uuid(0, row.get(0)?)?),
        name: row.get(1)?,
        bank_type: parse_bank_type(2, row.get(2)?)?,
        branches: Vec::new(),
        created_at: Some(parse_timestamp(3, row.get(3)?)?),
        updated_at: Some(parse_timestamp(4, row.get(4)?)?),
    })
}

fn branch_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: Some(parse_uuid(0, row.get(0)?)?),
        code: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        bank_id: Some(parse_uuid(4, row.get(4)?)?),
        created_at: Some(parse_timestamp(5, row.get(5)?)?),
        updated_at: Some(parse_timestamp(6, row.get(6)?)?),
    })
}

// ============================================================================
// QUERIES
// ============================================================================

/// All banks with their branches, banks by name, branches by code
pub fn get_all_banks(conn: &Connection) -> Result<Vec<Bank>, BankError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, created_at, updated_at
         FROM banks
         ORDER BY name",
    )?;

    let mut banks = stmt
        .query_map([], bank_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, code, address, phone, bank_id, created_at, updated_at
         FROM branches
         ORDER BY code",
    )?;

    let mut by_bank: HashMap<Uuid, Vec<Branch>> = HashMap::new();
    for branch in stmt.query_map([], branch_from_row)? {
        let branch = branch?;
        if let Some(bank_id) = branch.bank_id {
            by_bank.entry(bank_id).or_default().push(branch);
        }
    }

    for bank in &mut banks {
        if let Some(branches) = bank.id.and_then(|id| by_bank.remove(&id)) {
            bank.branches = branches;
        }
    }

    Ok(banks)
}

/// One bank with its branches, None when absent
pub fn get_bank(conn: &Connection, id: Uuid) -> Result<Option<Bank>, BankError> {
    let bank = conn
        .query_row(
            "SELECT id, name, type, created_at, updated_at FROM banks WHERE id = ?1",
            params![id.to_string()],
            bank_from_row,
        )
        .optional()?;

    let Some(mut bank) = bank else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, code, address, phone, bank_id, created_at, updated_at
         FROM branches
         WHERE bank_id = ?1
         ORDER BY code",
    )?;

    bank.branches = stmt
        .query_map(params![id.to_string()], branch_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(bank))
}

pub fn bank_exists(conn: &Connection, id: Uuid) -> Result<bool, BankError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM banks WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

pub fn count_branches(conn: &Connection) -> Result<i64, BankError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM branches", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// WRITES
// ============================================================================

/// Write the whole aggregate. Call inside a transaction.
///
/// - bank without id → inserted with a fresh id
/// - bank with id → name/type updated (NotFound if the row is gone)
/// - branches of this bank no longer in `bank.branches` → deleted
/// - branches with id → address/phone updated, `updated_at` bumped only on change
/// - branches without id → inserted, owned by this bank
///
/// Ids and timestamps assigned here are written back into `bank`.
pub fn write_bank(conn: &Connection, bank: &mut Bank) -> Result<(), BankError> {
    let now = Utc::now();
    let now_str = now.to_rfc3339();

    let bank_id = match bank.id {
        None => {
            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO banks (id, name, type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![id.to_string(), bank.name, bank.bank_type.as_str(), now_str],
            )?;
            bank.id = Some(id);
            bank.created_at = Some(now);
            bank.updated_at = Some(now);
            id
        }
        Some(id) => {
            if !bank_exists(conn, id)? {
                return Err(BankError::NotFound(id));
            }
            let changed = conn.execute(
                "UPDATE banks SET name = ?2, type = ?3, updated_at = ?4
                 WHERE id = ?1 AND (name <> ?2 OR type <> ?3)",
                params![id.to_string(), bank.name, bank.bank_type.as_str(), now_str],
            )?;
            if changed > 0 {
                bank.updated_at = Some(now);
            }
            id
        }
    };

    // 1. Orphans: rows of this bank whose id is no longer in the aggregate
    let kept: HashSet<String> = bank
        .branches
        .iter()
        .filter_map(|b| b.id)
        .map(|id| id.to_string())
        .collect();

    let mut stmt = conn.prepare("SELECT id FROM branches WHERE bank_id = ?1")?;
    let existing = stmt
        .query_map(params![bank_id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for orphan in existing.iter().filter(|id| !kept.contains(*id)) {
        conn.execute("DELETE FROM branches WHERE id = ?1", params![orphan])?;
    }

    // 2. Claimed branches
    for branch in bank.branches.iter_mut().filter(|b| !b.is_new()) {
        let Some(id) = branch.id else { continue };
        let changed = conn.execute(
            "UPDATE branches SET address = ?2, phone = ?3, updated_at = ?4
             WHERE id = ?1 AND bank_id = ?5 AND (address <> ?2 OR phone <> ?3)",
            params![
                id.to_string(),
                branch.address,
                branch.phone,
                now_str,
                bank_id.to_string()
            ],
        )?;
        if changed > 0 {
            branch.updated_at = Some(now);
        }
    }

    // 3. New branches
    for branch in bank.branches.iter_mut().filter(|b| b.is_new()) {
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO branches (id, code, address, phone, bank_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id.to_string(),
                branch.code,
                branch.address,
                branch.phone,
                bank_id.to_string(),
                now_str
            ],
        )?;
        branch.id = Some(id);
        branch.bank_id = Some(bank_id);
        branch.created_at = Some(now);
        branch.updated_at = Some(now);
    }

    Ok(())
}

/// Delete a bank; its branches go with it (cascade)
pub fn delete_bank(conn: &Connection, id: Uuid) -> Result<(), BankError> {
    let deleted = conn.execute("DELETE FROM banks WHERE id = ?1", params![id.to_string()])?;

    if deleted == 0 {
        return Err(BankError::NotFound(id));
    }

    Ok(())
}

// ============================================================================
// BANK STORE
// ============================================================================

/// Thread-safe store over a single SQLite connection.
///
/// The mutex makes this a single writer: every read-modify-write runs inside
/// one IMMEDIATE transaction while the lock is held, so two updates to the
/// same bank can never interleave.
pub struct BankStore {
    conn: Mutex<Connection>,
}

impl BankStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BankError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, BankError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, BankError> {
        setup_database(&conn)?;

        Ok(BankStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, BankError> {
        self.conn
            .lock()
            .map_err(|_| BankError::Internal(anyhow!("bank store lock poisoned")))
    }

    pub fn find_all(&self) -> Result<Vec<Bank>, BankError> {
        let conn = self.lock()?;
        get_all_banks(&conn)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Bank, BankError> {
        let conn = self.lock()?;
        get_bank(&conn, id)?.ok_or(BankError::NotFound(id))
    }

    pub fn exists_by_id(&self, id: Uuid) -> Result<bool, BankError> {
        let conn = self.lock()?;
        bank_exists(&conn, id)
    }

    /// Insert or update the whole aggregate atomically
    pub fn save(&self, mut bank: Bank) -> Result<Bank, BankError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        write_bank(&tx, &mut bank)?;
        tx.commit()?;

        Ok(bank)
    }

    /// Load a bank, let `change` mutate it, save it: all in one transaction.
    ///
    /// Returns the saved bank and whatever `change` returned.
    pub fn update_with<F, R>(&self, id: Uuid, change: F) -> Result<(Bank, R), BankError>
    where
        F: FnOnce(&mut Bank) -> R,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut bank = get_bank(&tx, id)?.ok_or(BankError::NotFound(id))?;
        let outcome = change(&mut bank);
        write_bank(&tx, &mut bank)?;
        tx.commit()?;

        Ok((bank, outcome))
    }

    pub fn delete(&self, id: Uuid) -> Result<(), BankError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        delete_bank(&tx, id)?;
        tx.commit()?;

        Ok(())
    }

    pub fn branch_count(&self) -> Result<i64, BankError> {
        let conn = self.lock()?;
        count_branches(&conn)
    }
}
