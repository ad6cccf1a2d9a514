// ⚖️ Reconciliation Engine - Make a bank's branches match a proposed set
//
// Matching is by natural key (branch code), never by id: callers do not know
// store-assigned ids when they propose an update.
//
//   persisted ∩ proposed  → updated in place (id, code, owner untouched)
//   proposed  - persisted → appended as new branches (no id)
//   persisted - proposed  → orphans, removed from the aggregate
//
// The engine only rewrites the in-memory aggregate. Physical inserts,
// updates and deletes happen when the store saves it.

use crate::entities::{Bank, BankDraft, Branch};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

/// Structural changes applied by one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Codes appended as new branches
    pub inserted: Vec<String>,

    /// Codes matched whose address or phone changed
    pub updated: Vec<String>,

    /// Codes matched with no field change
    pub unchanged: Vec<String>,

    /// Orphans removed from the aggregate (the store must delete these)
    pub removed: Vec<Branch>,
}

impl ReconciliationReport {
    /// True when branches were added or removed
    pub fn has_structural_changes(&self) -> bool {
        !self.inserted.is_empty() || !self.removed.is_empty()
    }

    pub fn removed_codes(&self) -> Vec<&str> {
        self.removed.iter().map(|b| b.code.as_str()).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inserted, {} updated, {} unchanged, {} removed",
            self.inserted.len(),
            self.updated.len(),
            self.unchanged.len(),
            self.removed.len()
        )
    }
}

// ============================================================================
// AGGREGATE RECONCILER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateReconciler;

impl AggregateReconciler {
    pub fn new() -> Self {
        AggregateReconciler
    }

    /// Reconcile `persisted` against `proposed`, mutating `persisted` in place.
    ///
    /// `proposed.branches` is expected to be non-empty (checked upstream).
    /// If the same code appears twice in `proposed`, the later occurrence's
    /// fields win on the single branch carrying that code.
    pub fn reconcile(&self, persisted: &mut Bank, proposed: BankDraft) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        // 1. Index current branches by code (code → position)
        let mut current: HashMap<String, usize> = persisted
            .branches
            .iter()
            .enumerate()
            .map(|(pos, branch)| (branch.code.clone(), pos))
            .collect();

        // Codes already handled in this pass (matched or inserted)
        let mut claimed: HashMap<String, usize> = HashMap::new();

        // Matched positions in proposal order, and whether any edit changed them
        let mut matched: Vec<usize> = Vec::new();
        let mut changed: HashMap<usize, bool> = HashMap::new();

        // 2. Claim matches, append the rest
        for draft in proposed.branches {
            if let Some(pos) = current.remove(&draft.code) {
                let edited = persisted.branches[pos].apply(&draft);
                matched.push(pos);
                changed.insert(pos, edited);
                claimed.insert(draft.code, pos);
            } else if let Some(&pos) = claimed.get(&draft.code) {
                let edited = persisted.branches[pos].apply(&draft);
                if let Some(flag) = changed.get_mut(&pos) {
                    *flag |= edited;
                }
            } else {
                let pos = persisted.branches.len();
                report.inserted.push(draft.code.clone());
                claimed.insert(draft.code.clone(), pos);
                persisted.branches.push(Branch::from_draft(draft, persisted.id));
            }
        }

        for pos in matched {
            let code = persisted.branches[pos].code.clone();
            if changed.get(&pos).copied().unwrap_or(false) {
                report.updated.push(code);
            } else {
                report.unchanged.push(code);
            }
        }

        // 3. Whatever was never claimed is an orphan
        let orphans: HashSet<usize> = current.into_values().collect();
        let (kept, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut persisted.branches)
            .into_iter()
            .enumerate()
            .partition(|(pos, _)| !orphans.contains(pos));

        persisted.branches = kept.into_iter().map(|(_, branch)| branch).collect();
        report.removed = removed.into_iter().map(|(_, branch)| branch).collect();

        // 4. Parent values
        persisted.name = proposed.name;
        persisted.bank_type = proposed.bank_type;

        debug!(
            bank_id = ?persisted.id,
            inserted = ?report.inserted,
            updated = ?report.updated,
            removed = ?report.removed_codes(),
            "Reconciled bank branches"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BankType, BranchDraft};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    /// A bank as the store would return it: every id and timestamp assigned
    fn persisted_bank(codes: &[&str]) -> Bank {
        let bank_id = Uuid::new_v4();
        let now = Utc::now();

        Bank {
            id: Some(bank_id),
            name: "Bank 1".to_string(),
            bank_type: BankType::Public,
            branches: codes
                .iter()
                .map(|code| Branch {
                    id: Some(Uuid::new_v4()),
                    code: code.to_string(),
                    address: format!("Address {}", code),
                    phone: format!("Phone {}", code),
                    bank_id: Some(bank_id),
                    created_at: Some(now),
                    updated_at: Some(now),
                })
                .collect(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn proposal(branches: &[(&str, &str)]) -> BankDraft {
        BankDraft::new(
            "Updated Bank",
            BankType::Private,
            branches
                .iter()
                .map(|(code, address)| BranchDraft::new(*code, *address, format!("Phone {}", code)))
                .collect(),
        )
    }

    #[test]
    fn test_update_existing_and_insert_new() {
        let mut bank = persisted_bank(&["0001"]);
        let original = bank.branches[0].clone();

        let report = AggregateReconciler::new().reconcile(
            &mut bank,
            proposal(&[("0001", "New Address"), ("0002", "Branch Avenue")]),
        );

        assert_eq!(bank.branches.len(), 2);

        let kept = bank.branch("0001").unwrap();
        assert_eq!(kept.id, original.id);
        assert_eq!(kept.bank_id, original.bank_id);
        assert_eq!(kept.created_at, original.created_at);
        assert_eq!(kept.address, "New Address");

        let added = bank.branch("0002").unwrap();
        assert!(added.is_new());
        assert_eq!(added.bank_id, bank.id);

        assert_eq!(report.inserted, vec!["0002".to_string()]);
        assert_eq!(report.updated, vec!["0001".to_string()]);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_orphan_is_removed() {
        let mut bank = persisted_bank(&["0001", "0002"]);
        let kept_id = bank.branch("0001").unwrap().id;
        let orphan_id = bank.branch("0002").unwrap().id;

        let report = AggregateReconciler::new()
            .reconcile(&mut bank, proposal(&[("0001", "Address 0001")]));

        assert_eq!(bank.branches.len(), 1);
        assert_eq!(bank.branches[0].id, kept_id);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].id, orphan_id);
        assert!(report.inserted.is_empty());
    }

    #[test]
    fn test_same_codes_is_not_structural() {
        let mut bank = persisted_bank(&["0001", "0002"]);

        let report = AggregateReconciler::new().reconcile(
            &mut bank,
            proposal(&[("0002", "Address 0002"), ("0001", "Moved")]),
        );

        assert!(!report.has_structural_changes());
        assert_eq!(report.updated, vec!["0001".to_string()]);
        assert_eq!(report.unchanged, vec!["0002".to_string()]);
    }

    #[test]
    fn test_disjoint_proposal_replaces_everything() {
        let mut bank = persisted_bank(&["0001", "0002"]);

        let report = AggregateReconciler::new().reconcile(
            &mut bank,
            proposal(&[("0003", "A"), ("0004", "B")]),
        );

        assert_eq!(report.removed_codes(), vec!["0001", "0002"]);
        assert_eq!(report.inserted, vec!["0003".to_string(), "0004".to_string()]);
        assert!(bank.branches.iter().all(Branch::is_new));
    }

    #[test]
    fn test_parent_values_overwritten() {
        let mut bank = persisted_bank(&["0001"]);
        let id = bank.id;

        AggregateReconciler::new().reconcile(&mut bank, proposal(&[("0001", "A")]));

        assert_eq!(bank.id, id);
        assert_eq!(bank.name, "Updated Bank");
        assert_eq!(bank.bank_type, BankType::Private);
    }

    #[test]
    fn test_duplicate_code_last_write_wins() {
        let mut bank = persisted_bank(&["0001"]);
        let original_id = bank.branches[0].id;

        let report = AggregateReconciler::new().reconcile(
            &mut bank,
            proposal(&[("0001", "First"), ("0001", "Second"), ("0009", "X"), ("0009", "Y")]),
        );

        assert_eq!(bank.branches.len(), 2);
        assert_eq!(bank.branch("0001").unwrap().id, original_id);
        assert_eq!(bank.branch("0001").unwrap().address, "Second");
        assert_eq!(bank.branch("0009").unwrap().address, "Y");
        assert_eq!(report.inserted, vec!["0009".to_string()]);
    }

    #[test]
    fn test_duplicate_code_change_is_reported_once() {
        let mut bank = persisted_bank(&["0001", "0002"]);

        // Second occurrence carries the edit, first one is a no-op
        let report = AggregateReconciler::new().reconcile(
            &mut bank,
            proposal(&[("0001", "Address 0001"), ("0002", "Address 0002"), ("0001", "Edited")]),
        );

        assert_eq!(report.updated, vec!["0001".to_string()]);
        assert_eq!(report.unchanged, vec!["0002".to_string()]);
        assert_eq!(bank.branch("0001").unwrap().address, "Edited");
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut bank = persisted_bank(&["0001", "0002"]);
        let target = proposal(&[("0002", "Z"), ("0003", "New")]);
        let reconciler = AggregateReconciler::new();

        reconciler.reconcile(&mut bank, target.clone());
        let snapshot = bank.clone();
        let second = reconciler.reconcile(&mut bank, target);

        assert!(!second.has_structural_changes());
        assert!(second.updated.is_empty());
        assert_eq!(bank, snapshot);
    }

    fn code_set() -> impl Strategy<Value = BTreeSet<String>> {
        proptest::collection::btree_set("[0-9]{1,2}", 0..8)
    }

    proptest! {
        #[test]
        fn result_codes_equal_proposed_codes(current in code_set(), target in code_set().prop_filter("non-empty", |s| !s.is_empty())) {
            let current_refs: Vec<&str> = current.iter().map(String::as_str).collect();
            let mut bank = persisted_bank(&current_refs);
            let before = bank.clone();

            let draft = BankDraft::new(
                "P",
                BankType::Public,
                target.iter().map(|c| BranchDraft::new(c.clone(), format!("new {}", c), "1")).collect(),
            );
            let report = AggregateReconciler::new().reconcile(&mut bank, draft);

            let result: BTreeSet<String> = bank.branches.iter().map(|b| b.code.clone()).collect();
            prop_assert_eq!(&result, &target);
            prop_assert_eq!(bank.branches.len(), target.len());

            for branch in &bank.branches {
                prop_assert_eq!(&branch.address, &format!("new {}", branch.code));
                prop_assert_eq!(branch.bank_id, bank.id);
                match before.branch(&branch.code) {
                    Some(old) => {
                        prop_assert_eq!(branch.id, old.id);
                    }
                    None => {
                        prop_assert!(branch.is_new());
                    }
                }
            }

            for orphan in &report.removed {
                prop_assert!(!target.contains(&orphan.code));
                prop_assert!(current.contains(&orphan.code));
            }
            prop_assert_eq!(report.removed.len(), current.difference(&target).count());
            prop_assert_eq!(report.inserted.len(), target.difference(&current).count());
        }
    }
}
