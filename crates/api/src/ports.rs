// Path: crates/api/src/ports.rs
//! Port traits describing every external collaborator the services crate
//! depends on (spec §6, "External Interfaces"). Concrete implementations
//! live in `rental-storage` (for the store ports, as an in-memory reference)
//! and would live in a transport-facing crate for the adapter ports; this
//! workspace supplies fakes for the latter so the workflow logic is fully
//! exercisable without a real SMTP/SMS provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rental_types::contract::{Contract, Role};
use rental_types::error::StoreError;
use rental_types::guarantee::Guarantee;
use rental_types::history::WorkflowHistoryEntry;
use rental_types::ids::{
    ContractId, ContractNumber, DigestId, GuaranteeId, InvitationId, MatchCriteriaId,
    MatchRequestId, NotificationId, ObjectionId, PropertyId, UserId,
};
use rental_types::invitation::Invitation;
use rental_types::matching::{MatchCriteria, MatchRequest, PropertyListing};
use rental_types::notification::{
    Notification, NotificationChannel, NotificationDelivery, NotificationDigest,
    NotificationPreference,
};
use rental_types::objection::Objection;

type StoreResult<T> = Result<T, StoreError>;

/// Supplies the current time. A trait (rather than calling `Utc::now()`
/// directly) so tests can pin the clock (spec §8, scenarios that depend on
/// expiry and "overdue" windows).
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Persistence for [`Contract`] rows and their append-only workflow history
/// (spec §4.1, §4.8).
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn insert(&self, contract: Contract) -> StoreResult<()>;
    async fn get(&self, id: ContractId) -> StoreResult<Contract>;
    async fn update(&self, contract: Contract) -> StoreResult<()>;
    async fn next_contract_number(&self, year: i32) -> StoreResult<ContractNumber>;
    async fn append_history(&self, entry: WorkflowHistoryEntry) -> StoreResult<()>;
    async fn history_for(&self, contract_id: ContractId) -> StoreResult<Vec<WorkflowHistoryEntry>>;
    async fn list_by_landlord(&self, landlord_id: UserId) -> StoreResult<Vec<Contract>>;
    async fn list_by_tenant(&self, tenant_id: UserId) -> StoreResult<Vec<Contract>>;
    async fn list_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Contract>>;
    /// Contracts whose `start_date` has arrived, for the `PUBLISHED -> ACTIVE`
    /// sweep (spec §4.8).
    async fn list_starting_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Contract>>;
}

/// Persistence for [`Invitation`] rows (spec §4.5).
#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn insert(&self, invitation: Invitation) -> StoreResult<()>;
    async fn get(&self, id: InvitationId) -> StoreResult<Invitation>;
    async fn get_by_token_hash(&self, token_hash: &str) -> StoreResult<Invitation>;
    async fn update(&self, invitation: Invitation) -> StoreResult<()>;
    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Invitation>>;
    async fn list_expired_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Invitation>>;
}

/// Persistence for [`Objection`] rows (spec §4.6).
#[async_trait]
pub trait ObjectionStore: Send + Sync {
    async fn insert(&self, objection: Objection) -> StoreResult<()>;
    async fn get(&self, id: ObjectionId) -> StoreResult<Objection>;
    async fn update(&self, objection: Objection) -> StoreResult<()>;
    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Objection>>;
}

/// Persistence for [`Guarantee`] rows (spec §3).
#[async_trait]
pub trait GuaranteeStore: Send + Sync {
    async fn insert(&self, guarantee: Guarantee) -> StoreResult<()>;
    async fn get(&self, id: GuaranteeId) -> StoreResult<Guarantee>;
    async fn update(&self, guarantee: Guarantee) -> StoreResult<()>;
    async fn list_for_contract(&self, contract_id: ContractId) -> StoreResult<Vec<Guarantee>>;
}

/// Persistence for [`MatchRequest`]/[`MatchCriteria`] rows and a narrow read
/// model over the property catalog (spec §4.3).
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn insert_request(&self, request: MatchRequest) -> StoreResult<()>;
    async fn get_request(&self, id: MatchRequestId) -> StoreResult<MatchRequest>;
    async fn update_request(&self, request: MatchRequest) -> StoreResult<()>;
    async fn has_active_request(&self, tenant_id: UserId, property_id: PropertyId) -> StoreResult<bool>;
    async fn list_requests_for_landlord(&self, landlord_id: UserId) -> StoreResult<Vec<MatchRequest>>;
    async fn list_requests_for_tenant(&self, tenant_id: UserId) -> StoreResult<Vec<MatchRequest>>;
    async fn list_active_expiring_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<MatchRequest>>;

    async fn upsert_criteria(&self, criteria: MatchCriteria) -> StoreResult<()>;
    async fn get_criteria(&self, id: MatchCriteriaId) -> StoreResult<MatchCriteria>;
    async fn get_criteria_for_tenant(&self, tenant_id: UserId) -> StoreResult<MatchCriteria>;
    async fn list_auto_apply_criteria(&self) -> StoreResult<Vec<MatchCriteria>>;

    async fn list_available_properties(&self) -> StoreResult<Vec<PropertyListing>>;
}

/// Persistence for notifications, deliveries, preferences, and digests
/// (spec §4.2).
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> StoreResult<()>;
    async fn get(&self, id: NotificationId) -> StoreResult<Notification>;
    async fn update(&self, notification: Notification) -> StoreResult<()>;
    async fn list_for_recipient(&self, recipient_id: UserId) -> StoreResult<Vec<Notification>>;

    async fn insert_delivery(&self, delivery: NotificationDelivery) -> StoreResult<()>;
    async fn update_delivery(&self, delivery: NotificationDelivery) -> StoreResult<()>;
    async fn list_pending_deliveries(&self) -> StoreResult<Vec<NotificationDelivery>>;
    async fn list_failed_deliveries_for_retry(&self) -> StoreResult<Vec<NotificationDelivery>>;
    async fn list_deliveries_for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<NotificationDelivery>>;

    async fn get_preference(&self, user_id: UserId) -> StoreResult<NotificationPreference>;
    async fn upsert_preference(&self, preference: NotificationPreference) -> StoreResult<()>;

    async fn insert_digest(&self, digest: NotificationDigest) -> StoreResult<()>;
    async fn get_digest(&self, id: DigestId) -> StoreResult<NotificationDigest>;
    async fn update_digest(&self, digest: NotificationDigest) -> StoreResult<()>;
    async fn list_digests_for_recipient(&self, recipient_id: UserId) -> StoreResult<Vec<NotificationDigest>>;
}

/// Outcome of a single delivery attempt reported back by the transport
/// adapter (spec §4.2).
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    pub error: Option<String>,
}

/// Sends a rendered notification body over one channel. The out-of-scope
/// real implementation would wrap an email/SMS/WhatsApp provider SDK; this
/// workspace only defines the seam (spec §6, "Notification channel adapter").
#[async_trait]
pub trait ChannelAdapterPort: Send + Sync {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient_id: UserId,
        title: &str,
        body: &str,
    ) -> DeliveryOutcome;
}

/// Renders a contract's final document once it reaches `Published` (spec
/// §4.7, "publication"). Out of scope to implement for real; this crate
/// only defines the seam.
#[async_trait]
pub trait PdfRendererPort: Send + Sync {
    async fn render(&self, contract: &Contract) -> Result<Vec<u8>, String>;
}

/// Resolves display metadata (name, email, phone) for a user id. Out of
/// scope for this engine's own storage (spec §6: "User directory is owned
/// by an external identity service").
#[async_trait]
pub trait UserDirectoryPort: Send + Sync {
    async fn display_name(&self, user_id: UserId) -> Option<String>;
    async fn email(&self, user_id: UserId) -> Option<String>;
    async fn phone(&self, user_id: UserId) -> Option<String>;
    async fn role_in_contract(&self, user_id: UserId, contract: &Contract) -> Option<Role>;
}
