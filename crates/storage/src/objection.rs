// Path: crates/storage/src/objection.rs
//! In-memory reference implementation of [`ObjectionStore`] (spec §4.6).

use async_trait::async_trait;
use dashmap::DashMap;
use rental_api::ports::ObjectionStore;
use rental_types::error::StoreError;
use rental_types::ids::{ContractId, ObjectionId};
use rental_types::objection::Objection;

type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
pub struct InMemoryObjectionStore {
    rows: DashMap<ObjectionId, Objection>,
}

impl InMemoryObjectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectionStore for InMemoryObjectionStore {
    async fn insert(&self, objection: Objection) -> StoreResult<()> {
        self.rows.insert(objection.id, objection);
        Ok(())
    }

    async fn get(&self, id: ObjectionId) -> StoreResult<Objection> {
        self.rows
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, objection: Objection) -> StoreResult<()> {
        if !self.rows.contains_key(&objection.id) {
            return Err(StoreError::NotFound(objection.id.to_string()));
        }
        self.rows.insert(objection.id, objection);
        Ok(())
    }

    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Objection>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .map(|r| r.clone())
            .collect())
    }
}
