// Path: crates/storage/src/matching.rs
//! In-memory reference implementation of [`MatchStore`] (spec §4.3).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rental_api::ports::MatchStore;
use rental_types::error::StoreError;
use rental_types::ids::{MatchCriteriaId, MatchRequestId, PropertyId, UserId};
use rental_types::matching::{MatchCriteria, MatchRequest, PropertyListing};

type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
pub struct InMemoryMatchStore {
    requests: DashMap<MatchRequestId, MatchRequest>,
    criteria: DashMap<MatchCriteriaId, MatchCriteria>,
    criteria_by_tenant: DashMap<UserId, MatchCriteriaId>,
    properties: DashMap<PropertyId, PropertyListing>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds (or replaces) a property listing read by `find_matching`
    /// (spec §4.3); the property catalog itself is out of scope (spec §6),
    /// so this is the only way listings enter the reference store.
    pub fn seed_property(&self, listing: PropertyListing) {
        self.properties.insert(listing.id, listing);
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn insert_request(&self, request: MatchRequest) -> StoreResult<()> {
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn get_request(&self, id: MatchRequestId) -> StoreResult<MatchRequest> {
        self.requests
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_request(&self, request: MatchRequest) -> StoreResult<()> {
        if !self.requests.contains_key(&request.id) {
            return Err(StoreError::NotFound(request.id.to_string()));
        }
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn has_active_request(
        &self,
        tenant_id: UserId,
        property_id: PropertyId,
    ) -> StoreResult<bool> {
        Ok(self.requests.iter().any(|r| {
            r.tenant_id == tenant_id && r.property_id == property_id && r.status.is_active()
        }))
    }

    async fn list_requests_for_landlord(&self, landlord_id: UserId) -> StoreResult<Vec<MatchRequest>> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.landlord_id == landlord_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_requests_for_tenant(&self, tenant_id: UserId) -> StoreResult<Vec<MatchRequest>> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_active_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<Vec<MatchRequest>> {
        Ok(self
            .requests
            .iter()
            .filter(|r| r.status.is_active() && r.expires_at <= cutoff)
            .map(|r| r.clone())
            .collect())
    }

    async fn upsert_criteria(&self, criteria: MatchCriteria) -> StoreResult<()> {
        self.criteria_by_tenant
            .insert(criteria.tenant_id, criteria.id);
        self.criteria.insert(criteria.id, criteria);
        Ok(())
    }

    async fn get_criteria(&self, id: MatchCriteriaId) -> StoreResult<MatchCriteria> {
        self.criteria
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_criteria_for_tenant(&self, tenant_id: UserId) -> StoreResult<MatchCriteria> {
        let id = self
            .criteria_by_tenant
            .get(&tenant_id)
            .map(|r| *r)
            .ok_or_else(|| StoreError::NotFound("no criteria for tenant".into()))?;
        self.get_criteria(id).await
    }

    async fn list_auto_apply_criteria(&self) -> StoreResult<Vec<MatchCriteria>> {
        Ok(self
            .criteria
            .iter()
            .filter(|r| r.auto_apply)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_available_properties(&self) -> StoreResult<Vec<PropertyListing>> {
        Ok(self
            .properties
            .iter()
            .filter(|r| r.is_available)
            .map(|r| r.clone())
            .collect())
    }
}
