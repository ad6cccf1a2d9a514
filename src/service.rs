// 🏦 Bank Service - the operations behind each HTTP verb
//
// create   validate → build aggregate (all branches new) → save
// update   validate → [load → reconcile → save] in one store transaction
// delete   existence check → delete (branches cascade)
// get      pure reads
// consume  remote mirror pass-through
//
// Validation always runs before the store is touched.

use crate::db::BankStore;
use crate::dto::{BankRequest, BankResponse};
use crate::entities::Bank;
use crate::error::BankError;
use crate::mirror::RemoteMirror;
use crate::reconciliation::AggregateReconciler;
use crate::validation::validate_bank_request;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct BankService {
    store: Arc<BankStore>,
    reconciler: AggregateReconciler,
    mirror: RemoteMirror,
}

impl BankService {
    pub fn new(store: Arc<BankStore>, mirror: RemoteMirror) -> Self {
        BankService {
            store,
            reconciler: AggregateReconciler::new(),
            mirror,
        }
    }

    pub fn store(&self) -> &BankStore {
        &self.store
    }

    pub fn get_all(&self) -> Result<Vec<BankResponse>, BankError> {
        let banks = self.store.find_all()?;
        info!(count = banks.len(), "Fetched all banks");

        banks.into_iter().map(BankResponse::try_from).collect()
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<BankResponse, BankError> {
        let bank = self.store.find_by_id(id)?;
        info!(bank_id = %id, "Fetched bank");

        bank.try_into()
    }

    pub fn create(&self, request: BankRequest) -> Result<BankResponse, BankError> {
        let draft = validate_bank_request(request)?;
        let bank = self.store.save(Bank::from_draft(draft))?;

        info!(
            bank_id = ?bank.id,
            name = %bank.name,
            branches = bank.branches.len(),
            "Created bank"
        );

        bank.try_into()
    }

    pub fn update(&self, id: Uuid, request: BankRequest) -> Result<BankResponse, BankError> {
        let draft = validate_bank_request(request)?;

        let (bank, report) = self
            .store
            .update_with(id, |persisted| self.reconciler.reconcile(persisted, draft))?;

        info!(
            bank_id = %id,
            inserted = report.inserted.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            removed = report.removed.len(),
            "Updated bank: {}",
            report.summary()
        );

        bank.try_into()
    }

    pub fn delete(&self, id: Uuid) -> Result<(), BankError> {
        if !self.store.exists_by_id(id)? {
            return Err(BankError::NotFound(id));
        }

        self.store.delete(id)?;
        info!(bank_id = %id, "Deleted bank");

        Ok(())
    }

    /// Banks as reported by the peer service, untouched
    pub async fn consume_get_all(&self) -> Result<Vec<BankResponse>, BankError> {
        self.mirror.fetch_banks().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::BranchRequest;
    use crate::error::ConflictCause;
    use std::time::Duration;

    fn service() -> BankService {
        let store = Arc::new(BankStore::open_in_memory().unwrap());
        let mirror = RemoteMirror::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        BankService::new(store, mirror)
    }

    fn request(name: &str, branches: &[(&str, &str)]) -> BankRequest {
        BankRequest::new(
            name,
            "PUBLIC",
            branches
                .iter()
                .map(|(code, address)| BranchRequest::new(code, address, "11-1234-5678"))
                .collect(),
        )
    }

    #[test]
    fn test_create_then_get() {
        let service = service();

        let created = service.create(request("Bank 1", &[("0002", "B"), ("0001", "A")])).unwrap();
        let fetched = service.get_by_id(created.id).unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.branches[0].code, "0001");
        assert_eq!(service.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_reconciles_by_code() {
        let service = service();
        let created = service.create(request("Bank 1", &[("0001", "A"), ("0002", "B")])).unwrap();
        let kept_id = created.branches[0].id;

        let updated = service
            .update(created.id, request("Bank 1 Renamed", &[("0001", "A2"), ("0003", "C")]))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Bank 1 Renamed");
        let codes: Vec<&str> = updated.branches.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["0001", "0003"]);
        assert_eq!(updated.branches[0].id, kept_id);
        assert_eq!(updated.branches[0].address, "A2");
    }

    #[test]
    fn test_invalid_update_touches_nothing() {
        let service = service();
        let created = service.create(request("Bank 1", &[("0001", "A")])).unwrap();

        let err = service.update(created.id, request("Bank 1", &[])).unwrap_err();
        assert!(matches!(err, BankError::Validation(_)));

        assert_eq!(service.get_by_id(created.id).unwrap(), created);
    }

    #[test]
    fn test_validation_runs_before_existence_check() {
        let service = service();

        let err = service.update(Uuid::new_v4(), BankRequest::default()).unwrap_err();

        assert!(matches!(err, BankError::Validation(_)));
    }

    #[test]
    fn test_code_conflict_across_banks() {
        let service = service();
        service.create(request("Bank 1", &[("0003", "A")])).unwrap();

        let err = service.create(request("Bank 2", &[("0003", "B")])).unwrap_err();

        assert!(matches!(err, BankError::Conflict(ConflictCause::BranchCode)));
    }

    #[test]
    fn test_delete() {
        let service = service();
        let created = service.create(request("Bank 1", &[("0001", "A")])).unwrap();

        service.delete(created.id).unwrap();

        assert!(matches!(service.get_by_id(created.id), Err(BankError::NotFound(_))));
        assert!(matches!(service.delete(created.id), Err(BankError::NotFound(_))));
        assert_eq!(service.store().branch_count().unwrap(), 0);
    }
}
