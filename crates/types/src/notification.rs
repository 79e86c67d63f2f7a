//! Notification dispatch entities (spec §3, §4.2, "Notification").

use crate::ids::{ContractId, DeliveryId, DigestId, InvitationId, MatchRequestId, NotificationId, ObjectionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The event that triggered a notification; also selects its template
/// (spec §4.2, "Template selection").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContractCreated,
    ContractStateChanged,
    InvitationSent,
    InvitationAccepted,
    ObjectionSubmitted,
    ObjectionResolved,
    SignatureRequested,
    ContractPublished,
    MatchRequestReceived,
    MatchRequestAccepted,
    MatchFollowUpReminder,
    SystemAlert,
}

/// Requested urgency of delivery; `Critical` bypasses digesting (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// The notification's own lifecycle, distinct from any one delivery attempt
/// (spec §4.2: "creation is durable even when every delivery fails").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Created,
    Queued,
    Dispatched,
    PartiallyDelivered,
    Delivered,
    Failed,
    Suppressed,
}

/// A transport over which a notification can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Email,
    Sms,
    Push,
    Whatsapp,
}

/// Per-attempt delivery outcome (spec §4.2, "Delivery").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Bounced,
    Failed,
}

/// Points back at whatever domain object a notification concerns, without a
/// polymorphic foreign key: an explicit tagged union is preferred over the
/// Python system's generic `ContentType` foreign key (spec Design Notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "ref_type", rename_all = "snake_case")]
pub enum ContentRef {
    Contract { id: ContractId },
    Invitation { id: InvitationId },
    Objection { id: ObjectionId },
    MatchRequest { id: MatchRequestId },
    None,
}

/// A notification (spec §3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub title: String,
    pub body: String,
    pub content_ref: ContentRef,
    pub status: NotificationStatus,
    pub channels_attempted: Vec<NotificationChannel>,
    pub digest_id: Option<DigestId>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One delivery attempt of a notification over one channel (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDelivery {
    pub id: DeliveryId,
    pub notification_id: NotificationId,
    pub channel: NotificationChannel,
    pub status: DeliveryStatus,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl NotificationDelivery {
    /// Maximum retry attempts per channel before a delivery is abandoned
    /// (spec §4.2, grounded on the original system's per-channel `retry_attempts`).
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Backoff applied between retries, in seconds, indexed by attempt number.
    pub const RETRY_BACKOFF_SECONDS: [i64; 3] = [60, 300, 900];
}

/// How often a user wants low-priority notifications batched (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    Realtime,
    Hourly,
    Daily,
    Weekly,
}

/// A user's per-channel, per-kind delivery preferences (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: UserId,
    pub enabled_channels: Vec<NotificationChannel>,
    pub muted_kinds: Vec<NotificationKind>,
    pub digest_frequency: DigestFrequency,
    pub quiet_hours_start: Option<u8>,
    pub quiet_hours_end: Option<u8>,
}

impl NotificationPreference {
    /// Whether `kind` may be delivered (not created — creation always
    /// succeeds, spec §4.2) over `channel` per these preferences.
    pub fn allows(&self, kind: NotificationKind, channel: NotificationChannel) -> bool {
        !self.muted_kinds.contains(&kind) && self.enabled_channels.contains(&channel)
    }
}

/// A batched roll-up of several low-priority notifications (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDigest {
    pub id: DigestId,
    pub recipient_id: UserId,
    pub notification_ids: Vec<NotificationId>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Aggregate delivery statistics for a channel, exposed read-only for
/// operational visibility (spec §4.2, "Analytics").
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NotificationAnalytics {
    pub created: u64,
    pub delivered: u64,
    pub bounced: u64,
    pub failed: u64,
    pub suppressed_by_preference: u64,
}
