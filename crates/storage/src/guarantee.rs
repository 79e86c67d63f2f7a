// Path: crates/storage/src/guarantee.rs
//! In-memory reference implementation of [`GuaranteeStore`] (spec §3).
//!
//! Guarantees are attached to a contract but tracked independently so C7 can
//! query a guarantee's own lifecycle without reparsing `Contract::guarantees`.

use async_trait::async_trait;
use dashmap::DashMap;
use rental_api::ports::GuaranteeStore;
use rental_types::error::StoreError;
use rental_types::guarantee::Guarantee;
use rental_types::ids::{ContractId, GuaranteeId};

type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
pub struct InMemoryGuaranteeStore {
    rows: DashMap<GuaranteeId, Guarantee>,
    by_contract: DashMap<ContractId, Vec<GuaranteeId>>,
}

impl InMemoryGuaranteeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a guarantee with its contract for `list_for_contract`.
    /// Called by the service layer alongside `insert` since [`Guarantee`]
    /// itself carries no `contract_id` field (it is reached only through
    /// `Contract::guarantees`).
    pub fn link(&self, contract_id: ContractId, guarantee_id: GuaranteeId) {
        self.by_contract
            .entry(contract_id)
            .or_default()
            .push(guarantee_id);
    }
}

#[async_trait]
impl GuaranteeStore for InMemoryGuaranteeStore {
    async fn insert(&self, guarantee: Guarantee) -> StoreResult<()> {
        self.rows.insert(guarantee.id, guarantee);
        Ok(())
    }

    async fn get(&self, id: GuaranteeId) -> StoreResult<Guarantee> {
        self.rows
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, guarantee: Guarantee) -> StoreResult<()> {
        if !self.rows.contains_key(&guarantee.id) {
            return Err(StoreError::NotFound(guarantee.id.to_string()));
        }
        self.rows.insert(guarantee.id, guarantee);
        Ok(())
    }

    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Guarantee>> {
        let ids = self
            .by_contract
            .get(&contract_id)
            .map(|r| r.clone())
            .unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.rows.get(&id).map(|r| r.clone()))
            .collect())
    }
}
