//! The invitation token entity (spec §3, §4.5, "Invitation").

use crate::ids::{ContractId, InvitationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the invitation was (or will be) delivered out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationMethod {
    Email,
    Sms,
    Whatsapp,
}

/// The invitation lifecycle (spec §3: "monotonic within
/// {pending→sent→opened→accepted} with terminal {expired, failed}").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Sent,
    Opened,
    Accepted,
    Expired,
    Failed,
}

impl InvitationStatus {
    /// A status has no successor once it is one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvitationStatus::Accepted | InvitationStatus::Expired | InvitationStatus::Failed
        )
    }
}

/// A one-time invitation token (spec §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub contract_id: ContractId,
    /// Lowercase hex SHA-256 of the plaintext token. The plaintext is never
    /// persisted (spec §4.5, "Security").
    pub token_hash: String,
    pub tenant_email: String,
    pub tenant_phone: Option<String>,
    pub tenant_name: String,
    pub method: InvitationMethod,
    pub personal_message: Option<String>,
    pub status: InvitationStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub last_resent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_by: UserId,
    pub accepted_by: Option<UserId>,
}

/// The minimal, public-safe view returned by `verify()` (spec §4.5): no
/// token hash, no internal bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationPublicView {
    pub contract_id: ContractId,
    pub property_address: String,
    pub monthly_rent: Option<rust_decimal::Decimal>,
    pub landlord_display_name: String,
    pub expires_at: DateTime<Utc>,
}
