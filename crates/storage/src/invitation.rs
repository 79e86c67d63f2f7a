// Path: crates/storage/src/invitation.rs
//! In-memory reference implementation of [`InvitationStore`] (spec §4.5).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rental_api::ports::InvitationStore;
use rental_types::error::StoreError;
use rental_types::ids::{ContractId, InvitationId};
use rental_types::invitation::Invitation;

type StoreResult<T> = Result<T, StoreError>;

/// Keyed by [`InvitationId`], with a `token_hash` side index enforcing the
/// one-token-per-hash uniqueness constraint (spec §3).
#[derive(Default)]
pub struct InMemoryInvitationStore {
    rows: DashMap<InvitationId, Invitation>,
    by_token_hash: DashMap<String, InvitationId>,
}

impl InMemoryInvitationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvitationStore for InMemoryInvitationStore {
    async fn insert(&self, invitation: Invitation) -> StoreResult<()> {
        if self.by_token_hash.contains_key(&invitation.token_hash) {
            return Err(StoreError::Conflict(
                "invitation token_hash already exists".into(),
            ));
        }
        self.by_token_hash
            .insert(invitation.token_hash.clone(), invitation.id);
        self.rows.insert(invitation.id, invitation);
        Ok(())
    }

    async fn get(&self, id: InvitationId) -> StoreResult<Invitation> {
        self.rows
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> StoreResult<Invitation> {
        let id = self
            .by_token_hash
            .get(token_hash)
            .map(|r| *r)
            .ok_or_else(|| StoreError::NotFound("no invitation for token".into()))?;
        self.get(id).await
    }

    async fn update(&self, invitation: Invitation) -> StoreResult<()> {
        if !self.rows.contains_key(&invitation.id) {
            return Err(StoreError::NotFound(invitation.id.to_string()));
        }
        self.rows.insert(invitation.id, invitation);
        Ok(())
    }

    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Invitation>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.contract_id == contract_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_expired_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Invitation>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| !r.status.is_terminal() && r.expires_at <= cutoff)
            .map(|r| r.clone())
            .collect())
    }
}
