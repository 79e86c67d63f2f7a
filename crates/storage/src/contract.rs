// Path: crates/storage/src/contract.rs
//! In-memory reference implementation of [`ContractStore`] (spec §4.1, §4.8).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rental_api::ports::ContractStore;
use rental_crypto::ContractNumberAllocator;
use rental_types::contract::Contract;
use rental_types::error::StoreError;
use rental_types::history::WorkflowHistoryEntry;
use rental_types::ids::{ContractId, ContractNumber, UserId};

type StoreResult<T> = Result<T, StoreError>;

/// A `DashMap`-backed store keyed by [`ContractId`], with a side index
/// enforcing the `contract_number` uniqueness constraint (spec §3). History
/// is kept on `Contract::history` itself (spec §4.8, "history is
/// append-only") rather than in a parallel table.
#[derive(Default)]
pub struct InMemoryContractStore {
    rows: DashMap<ContractId, Contract>,
    numbers: DashMap<ContractNumber, ContractId>,
    allocator: ContractNumberAllocator,
}

impl InMemoryContractStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractStore for InMemoryContractStore {
    async fn insert(&self, contract: Contract) -> StoreResult<()> {
        if self.numbers.contains_key(&contract.contract_number) {
            return Err(StoreError::Conflict(format!(
                "contract_number {} already allocated",
                contract.contract_number
            )));
        }
        self.numbers
            .insert(contract.contract_number.clone(), contract.id);
        self.rows.insert(contract.id, contract);
        Ok(())
    }

    async fn get(&self, id: ContractId) -> StoreResult<Contract> {
        self.rows
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, contract: Contract) -> StoreResult<()> {
        if !self.rows.contains_key(&contract.id) {
            return Err(StoreError::NotFound(contract.id.to_string()));
        }
        self.rows.insert(contract.id, contract);
        Ok(())
    }

    async fn next_contract_number(&self, year: i32) -> StoreResult<ContractNumber> {
        Ok(self.allocator.allocate(year))
    }

    async fn append_history(&self, entry: WorkflowHistoryEntry) -> StoreResult<()> {
        let mut row = self
            .rows
            .get_mut(&entry.contract_id)
            .ok_or_else(|| StoreError::NotFound(entry.contract_id.to_string()))?;
        row.history.push(entry);
        Ok(())
    }

    async fn history_for(&self, contract_id: ContractId) -> StoreResult<Vec<WorkflowHistoryEntry>> {
        self.rows
            .get(&contract_id)
            .map(|r| r.history.clone())
            .ok_or_else(|| StoreError::NotFound(contract_id.to_string()))
    }

    async fn list_by_landlord(&self, landlord_id: UserId) -> StoreResult<Vec<Contract>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.landlord_id == landlord_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_by_tenant(&self, tenant_id: UserId) -> StoreResult<Vec<Contract>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.tenant_id == Some(tenant_id))
            .map(|r| r.clone())
            .collect())
    }

    async fn list_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Contract>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.end_date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc() <= cutoff)
                    .unwrap_or(false)
            })
            .map(|r| r.clone())
            .collect())
    }

    async fn list_starting_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Contract>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.start_date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc() <= cutoff)
                    .unwrap_or(false)
            })
            .map(|r| r.clone())
            .collect())
    }
}
