//! The objection / negotiation entity (spec §3, §4.6, "Objection").

use crate::contract::Role;
use crate::ids::{ContractId, ObjectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// How urgently the objection should be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// The objection lifecycle (spec §3: "status transitions only forward").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
    PartiallyAccepted,
    Resolved,
    Withdrawn,
}

impl ObjectionStatus {
    /// Whether this status still counts toward `has_pending_objections`.
    pub fn is_pending(self) -> bool {
        matches!(self, ObjectionStatus::Pending | ObjectionStatus::UnderReview)
    }
}

/// The response a party gives to an objection (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionResponse {
    Accepted,
    Rejected,
}

/// A structured counter-proposal against one field of the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objection {
    pub id: ObjectionId,
    pub contract_id: ContractId,
    pub objected_by: UserId,
    pub objector_role: Role,
    /// Dotted path into the contract data, e.g. `economic_terms.monthly_rent`.
    pub field_reference: String,
    pub current_value: JsonValue,
    pub proposed_value: JsonValue,
    pub justification: String,
    pub priority: ObjectionPriority,
    pub status: ObjectionStatus,
    pub responder: Option<UserId>,
    pub response_note: Option<String>,
    pub counter_proposal: Option<JsonValue>,
    pub requires_manual_amendment: bool,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Objection {
    /// Minimum justification length enforced at submission (spec §4.6).
    pub const MIN_JUSTIFICATION_LEN: usize = 20;

    /// Pending objections older than this are reported as `overdue`
    /// (spec §4.6); this is observable only, never transitions anything.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && now.signed_duration_since(self.submitted_at).num_days() >= 5
    }
}
