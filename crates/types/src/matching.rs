//! Match-request engine entities (spec §3, §4.3, "MatchRequest", "MatchCriteria").

use crate::ids::{MatchCriteriaId, MatchRequestId, PropertyId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The tenant's stated employment category, consulted by `compatibility_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    SelfEmployed,
    Student,
    Retired,
    Unemployed,
}

/// How urgently a tenant wants the match handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPriority {
    Low,
    Normal,
    High,
}

/// The match-request lifecycle (spec §3: "active := status ∈ {pending, viewed, accepted}").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Viewed,
    Accepted,
    Rejected,
    Expired,
    Cancelled,
}

impl MatchStatus {
    /// Whether this status counts toward the "at most one active request per
    /// (tenant, property)" invariant (spec §3, §8).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MatchStatus::Pending | MatchStatus::Viewed | MatchStatus::Accepted
        )
    }
}

/// Contact details supplied with a match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPayload {
    pub email: String,
    pub phone: Option<String>,
    pub preferred_contact_method: Option<String>,
}

/// A tenant's expression of interest in a property (spec §3, "MatchRequest").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub id: MatchRequestId,
    pub tenant_id: UserId,
    pub landlord_id: UserId,
    pub property_id: PropertyId,
    pub tenant_message: String,
    pub contact: ContactPayload,
    pub stated_monthly_income: Option<Decimal>,
    pub employment_type: Option<EmploymentType>,
    pub lease_duration_months: u32,
    pub occupants: u32,
    pub has_pets: bool,
    pub is_smoker: bool,
    pub priority: MatchPriority,
    pub status: MatchStatus,
    pub expires_at: DateTime<Utc>,
    pub follow_up_count: u32,
    pub last_follow_up: Option<DateTime<Utc>>,
    pub landlord_response: Option<String>,
    pub auto_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRequest {
    /// Default time-to-live for a match request (spec §3, §4.3).
    pub const DEFAULT_TTL_DAYS: i64 = 7;
}

/// How often a tenant wants to be notified about new matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchNotificationFrequency {
    Immediate,
    Daily,
    Weekly,
    Monthly,
}

/// A tenant's saved search criteria, one per tenant (spec §3, "MatchCriteria").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCriteria {
    pub id: MatchCriteriaId,
    pub tenant_id: UserId,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub preferred_cities: Vec<String>,
    pub property_types: Vec<String>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub min_area_sqm: Option<Decimal>,
    pub required_amenities: Vec<String>,
    pub requires_pets_allowed: bool,
    pub requires_furnished: bool,
    pub requires_parking: bool,
    pub requires_smoking_allowed: bool,
    pub auto_apply: bool,
    pub notification_frequency: MatchNotificationFrequency,
    pub last_search: Option<DateTime<Utc>>,
}

/// A property as seen by the matching engine (spec §4.3, `find_matching`);
/// a narrow read model over the out-of-scope property catalog (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: PropertyId,
    pub landlord_id: UserId,
    pub city: String,
    pub property_type: String,
    pub monthly_rent: Decimal,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqm: Decimal,
    pub amenities: Vec<String>,
    pub pets_allowed: bool,
    pub furnished: bool,
    pub parking_available: bool,
    pub smoking_allowed: bool,
    pub is_available: bool,
}
