//! The contract entity and its supporting enums (spec §3, "Contract").

use crate::guarantee::Guarantee;
use crate::history::WorkflowHistoryEntry;
use crate::ids::{ContractId, ContractNumber, PropertyId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

/// The kind of rental agreement a contract represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    RentalUrban,
    RentalCommercial,
    RentalRoom,
    RentalRural,
    Service,
}

/// The authoritative workflow state enum (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractState {
    Draft,
    LandlordCompleting,
    TenantInvited,
    TenantReviewing,
    ObjectionsPending,
    NegotiationInProgress,
    TenantDataPending,
    TenantAuthentication,
    LandlordReviewing,
    BothReviewing,
    ReadyToSign,
    FullySigned,
    Published,
    Active,
    Expired,
    Terminated,
    Cancelled,
}

impl ContractState {
    /// Terminal states from which no transition is possible (spec §4.8).
    pub fn is_terminal(self) -> bool {
        matches!(self, ContractState::Terminated | ContractState::Cancelled)
    }
}

impl std::fmt::Display for ContractState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The role a caller acts under. `System` and `Admin` are used by
/// scheduler-driven and operator-driven operations respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Landlord,
    Tenant,
    Guarantor,
    System,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Landlord => "landlord",
            Role::Tenant => "tenant",
            Role::Guarantor => "guarantor",
            Role::System => "system",
            Role::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

/// An opaque payload captured at signing time (Design Notes: biometric /
/// crypto verifications are placeholders; the core keeps them opaque).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePayload {
    pub signed_at: DateTime<Utc>,
    pub user_agent: String,
    pub ip_address: String,
    pub biometric_payload: Option<Vec<u8>>,
    pub device_fingerprint: Option<String>,
}

/// Per-party approval/signature bookkeeping, broken out of [`Contract`] for
/// readability; flattened onto the contract by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyStatus {
    pub approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signature: Option<SignaturePayload>,
}

/// The contract entity (spec §3, "Contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub contract_number: ContractNumber,
    pub contract_type: ContractType,
    pub current_state: ContractState,

    pub landlord_id: UserId,
    pub tenant_id: Option<UserId>,
    pub guarantor_id: Option<UserId>,
    pub property_id: PropertyId,

    pub landlord_data: JsonMap<String, JsonValue>,
    pub tenant_data: JsonMap<String, JsonValue>,
    pub property_data: JsonMap<String, JsonValue>,
    pub economic_terms: JsonMap<String, JsonValue>,
    pub contract_terms: JsonMap<String, JsonValue>,
    pub special_clauses: JsonMap<String, JsonValue>,

    pub landlord: PartyStatus,
    pub tenant: PartyStatus,
    pub guarantor: PartyStatus,

    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub published_by: Option<UserId>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pdf_handle: Option<String>,

    pub objections_count: u32,
    pub has_pending_objections: bool,
    pub last_objection_date: Option<DateTime<Utc>>,

    pub history: Vec<WorkflowHistoryEntry>,
    pub guarantees: Vec<Guarantee>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Whether the guarantor role is part of this contract at all.
    pub fn has_guarantor(&self) -> bool {
        self.guarantor_id.is_some()
    }

    /// The ten booleans behind `completion_percentage` (spec §4.4), in order.
    pub fn completion_flags(&self) -> [bool; 10] {
        [
            !self.landlord_data.is_empty(),
            !self.economic_terms.is_empty(),
            !self.contract_terms.is_empty(),
            self.tenant_id.is_some(),
            !self.tenant_data.is_empty(),
            !self.has_pending_objections,
            self.tenant.approved,
            self.tenant.signed,
            self.landlord.signed,
            self.published,
        ]
    }

    /// `completion_percentage` (spec §4.4): proportion, out of 10, of the
    /// completion flags that are true.
    pub fn completion_percentage(&self) -> u8 {
        let done = self.completion_flags().iter().filter(|b| **b).count();
        (done * 10) as u8
    }
}
