//! Append-only workflow history (spec §3, "WorkflowHistoryEntry").

use crate::contract::{ContractState, Role};
use crate::ids::{ContractId, GuaranteeId, HistoryEntryId, ObjectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

/// The kind of action recorded in a [`WorkflowHistoryEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ContractCreated,
    LandlordDataCompleted,
    InvitationSent,
    InvitationResent,
    InvitationAccepted,
    TenantDataCompleted,
    ObjectionSubmitted,
    ObjectionResponded,
    StateTransition,
    PartyApproved,
    PartySigned,
    ContractFullySigned,
    ContractPublished,
    GuaranteeAdded,
    ContractCancelled,
    ContractTerminated,
}

/// Free-form, non-sensitive context recorded alongside a history entry
/// (spec §3: "metadata (IP, UA, session, related_objection_id?,
/// related_guarantee_id?)").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub related_objection_id: Option<ObjectionId>,
    pub related_guarantee_id: Option<GuaranteeId>,
}

/// One append-only entry in a contract's workflow history. Never updated or
/// deleted after being written (spec §3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowHistoryEntry {
    pub id: HistoryEntryId,
    pub contract_id: ContractId,
    pub action_type: ActionType,
    pub description: String,
    pub performed_by: UserId,
    pub user_role: Role,
    pub old_state: Option<ContractState>,
    pub new_state: Option<ContractState>,
    pub changes_made: JsonMap<String, JsonValue>,
    pub metadata: HistoryMetadata,
    pub timestamp: DateTime<Utc>,
    pub integrity_hash: String,
}

impl WorkflowHistoryEntry {
    /// Computes `integrity_hash` per spec §3: SHA-256 of the canonical
    /// concatenation `contract_id:action_type:performed_by:timestamp:description`.
    pub fn compute_integrity_hash(
        contract_id: ContractId,
        action_type: ActionType,
        performed_by: UserId,
        timestamp: DateTime<Utc>,
        description: &str,
    ) -> String {
        let canonical = format!(
            "{}:{:?}:{}:{}:{}",
            contract_id,
            action_type,
            performed_by,
            timestamp.to_rfc3339(),
            description
        );
        let digest = Sha256::digest(canonical.as_bytes());
        hex::encode(digest)
    }

    /// Verifies that [`Self::integrity_hash`] matches a fresh recomputation,
    /// detecting tampering with any of the hashed fields (spec §4.4, §8).
    pub fn verify_integrity(&self) -> bool {
        let recomputed = Self::compute_integrity_hash(
            self.contract_id,
            self.action_type,
            self.performed_by,
            self.timestamp,
            &self.description,
        );
        recomputed == self.integrity_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_hash_round_trips() {
        let contract_id = ContractId::new();
        let performed_by = UserId::new();
        let ts = Utc::now();
        let hash = WorkflowHistoryEntry::compute_integrity_hash(
            contract_id,
            ActionType::ContractCreated,
            performed_by,
            ts,
            "created",
        );
        assert_eq!(hash.len(), 64);
        let entry = WorkflowHistoryEntry {
            id: HistoryEntryId::new(),
            contract_id,
            action_type: ActionType::ContractCreated,
            description: "created".into(),
            performed_by,
            user_role: Role::Landlord,
            old_state: None,
            new_state: None,
            changes_made: JsonMap::new(),
            metadata: HistoryMetadata::default(),
            timestamp: ts,
            integrity_hash: hash,
        };
        assert!(entry.verify_integrity());
    }
}
