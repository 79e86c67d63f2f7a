//! The guarantee entity, attached to a contract (spec §3, "Guarantee").

use crate::ids::{GuaranteeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of guarantee backing a tenancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuaranteeType {
    CoSigner,
    SuretyPolicy,
    SecurityDeposit,
    BankGuarantee,
}

/// The guarantee's own lifecycle; it never gates the contract state machine
/// directly (spec §3), only the `requires_guarantee_before_ready_to_sign`
/// policy consulted by C7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuaranteeStatus {
    Pending,
    Active,
    Verified,
    Rejected,
    Expired,
}

/// A guarantee attached to a contract (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guarantee {
    pub id: GuaranteeId,
    pub guarantee_type: GuaranteeType,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    /// Present for `CoSigner` guarantees.
    pub co_signer_id: Option<UserId>,
    /// Present for `SuretyPolicy` / `BankGuarantee` guarantees.
    pub policy_number: Option<String>,
    pub issuer: Option<String>,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub status: GuaranteeStatus,
    pub verified: bool,
    pub verified_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
