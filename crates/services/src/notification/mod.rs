// Path: crates/services/src/notification/mod.rs
//! The notification fan-out dispatcher (C2, spec §4.2), used by every other
//! component to reach a user across channels.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rental_api::Services;
use rental_types::error::NotificationError;
use rental_types::ids::{DigestId, NotificationId, UserId};
use rental_types::notification::{
    ContentRef, DeliveryStatus, DigestFrequency, Notification, NotificationChannel,
    NotificationDelivery, NotificationDigest, NotificationKind, NotificationPreference,
    NotificationPriority, NotificationStatus,
};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;
use tracing::info;

/// Fixed delivery ordering when several channels are eligible for the same
/// notification (spec §4.2, "sorted by channel priority"): most immediate
/// and least intrusive first.
const CHANNEL_PRIORITY: [NotificationChannel; 5] = [
    NotificationChannel::InApp,
    NotificationChannel::Push,
    NotificationChannel::Sms,
    NotificationChannel::Whatsapp,
    NotificationChannel::Email,
];

/// Generic per-user cap on notifications created per day, standing in for
/// the source system's per-user `max_frequency_per_user_per_day` setting.
const MAX_PER_USER_PER_DAY: usize = 50;

const RATE_LIMIT_PER_MINUTE: usize = 10;
const RATE_LIMIT_PER_HOUR: usize = 100;

#[derive(Clone)]
pub struct NotificationDispatcher {
    services: Services,
    rate_state: Arc<DashMap<(UserId, NotificationChannel), Vec<DateTime<Utc>>>>,
}

/// Everything the caller supplies to create a notification (spec §4.2).
pub struct NotificationRequest {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub title: String,
    /// The message, or a `{{ var }}` template rendered against `context`.
    pub template: String,
    pub context: JsonMap<String, JsonValue>,
    pub priority: NotificationPriority,
    pub content_ref: ContentRef,
    pub channels: Option<Vec<NotificationChannel>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NotificationDispatcher {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            rate_state: Arc::new(DashMap::new()),
        }
    }

    /// `create_notification` (spec §4.2). Returns `Ok(None)` when the
    /// notification is blocked by preferences, the daily cap, or quiet
    /// hours, rather than erroring — creation never fails for those reasons.
    pub async fn create_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<Option<Notification>, NotificationError> {
        let preference = match self.services.notifications.get_preference(request.recipient).await {
            Ok(p) => p,
            Err(_) => default_preference(request.recipient),
        };
        if preference.muted_kinds.contains(&request.kind) {
            return Ok(None);
        }

        let now = self.services.clock.now();
        let today_count = self
            .services
            .notifications
            .list_for_recipient(request.recipient)
            .await?
            .iter()
            .filter(|n| n.created_at.date_naive() == now.date_naive())
            .count();
        if today_count >= MAX_PER_USER_PER_DAY {
            rental_telemetry::notification_metrics().inc_suppressed_by_preference("daily_cap");
            return Ok(None);
        }

        if request.priority != NotificationPriority::Critical && in_quiet_hours(&preference, now) {
            rental_telemetry::notification_metrics().inc_suppressed_by_preference("quiet_hours");
            return Ok(None);
        }

        let requested_channels = request
            .channels
            .clone()
            .unwrap_or_else(|| preference.enabled_channels.clone());
        let mut channels: Vec<NotificationChannel> = CHANNEL_PRIORITY
            .into_iter()
            .filter(|c| requested_channels.contains(c) && preference.allows(request.kind, *c))
            .collect();
        channels.dedup();
        if channels.is_empty() {
            return Ok(None);
        }

        let body = render_template(&request.template, &request.context);
        let notification = Notification {
            id: NotificationId::new(),
            recipient_id: request.recipient,
            kind: request.kind,
            priority: request.priority,
            title: request.title,
            body,
            content_ref: request.content_ref,
            status: NotificationStatus::Created,
            channels_attempted: Vec::new(),
            digest_id: None,
            read: false,
            read_at: None,
            created_at: now,
            updated_at: now,
        };
        self.services.notifications.insert(notification.clone()).await?;

        for channel in &channels {
            let delivery = NotificationDelivery {
                id: rental_types::ids::DeliveryId::new(),
                notification_id: notification.id,
                channel: *channel,
                status: DeliveryStatus::Pending,
                attempt: 0,
                last_error: None,
                scheduled_at: request.scheduled_at.unwrap_or(now),
                sent_at: None,
                delivered_at: None,
            };
            self.services.notifications.insert_delivery(delivery).await?;
        }

        rental_telemetry::notification_metrics().inc_notifications_created(kind_label(notification.kind));
        info!(notification_id = %notification.id, recipient = %request.recipient, "notification created");

        if request.scheduled_at.is_none() {
            self.send(notification.id).await?;
        }
        Ok(Some(self.services.notifications.get(notification.id).await?))
    }

    /// `send` (spec §4.2): dispatches every still-pending delivery of one
    /// notification, applying a per-channel sliding-window rate limit before
    /// invoking the channel adapter, then rolls up the notification status.
    pub async fn send(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        let notification = self.services.notifications.get(notification_id).await?;
        let deliveries = self
            .services
            .notifications
            .list_deliveries_for_notification(notification_id)
            .await?;

        let mut any_delivered = false;
        let mut any_pending = false;
        for mut delivery in deliveries {
            if !matches!(delivery.status, DeliveryStatus::Pending) {
                any_delivered |= matches!(delivery.status, DeliveryStatus::Sent | DeliveryStatus::Delivered);
                continue;
            }
            if !self.allow_send(notification.recipient_id, delivery.channel) {
                delivery.status = DeliveryStatus::Failed;
                delivery.last_error = Some("rate limit exceeded".into());
                self.services.notifications.update_delivery(delivery).await?;
                rental_telemetry::notification_metrics()
                    .inc_delivery_attempt(channel_label(delivery.channel), "rate_limited");
                continue;
            }

            let outcome = self
                .services
                .channel_adapter
                .send(delivery.channel, notification.recipient_id, &notification.title, &notification.body)
                .await;
            delivery.attempt += 1;
            if outcome.delivered {
                delivery.status = DeliveryStatus::Sent;
                delivery.sent_at = Some(self.services.clock.now());
                any_delivered = true;
                rental_telemetry::notification_metrics()
                    .inc_delivery_attempt(channel_label(delivery.channel), "sent");
            } else {
                delivery.last_error = outcome.error;
                if delivery.attempt < NotificationDelivery::MAX_ATTEMPTS {
                    delivery.status = DeliveryStatus::Failed;
                    let backoff = NotificationDelivery::RETRY_BACKOFF_SECONDS
                        [(delivery.attempt as usize - 1).min(2)];
                    delivery.scheduled_at = self.services.clock.now() + Duration::seconds(backoff);
                    any_pending = true;
                } else {
                    delivery.status = DeliveryStatus::Failed;
                }
                rental_telemetry::notification_metrics()
                    .inc_delivery_attempt(channel_label(delivery.channel), "failed");
            }
            self.services.notifications.update_delivery(delivery).await?;
        }

        let mut notification = notification;
        notification.status = if any_delivered {
            NotificationStatus::Dispatched
        } else if any_pending {
            NotificationStatus::Queued
        } else {
            NotificationStatus::Failed
        };
        notification.updated_at = self.services.clock.now();
        self.services.notifications.update(notification).await?;
        Ok(())
    }

    /// `process_scheduled` (spec §4.2): sends every delivery whose
    /// `scheduled_at` has arrived.
    pub async fn process_scheduled(&self) -> Result<u64, NotificationError> {
        let now = self.services.clock.now();
        let due: Vec<NotificationId> = self
            .services
            .notifications
            .list_pending_deliveries()
            .await?
            .into_iter()
            .filter(|d| d.scheduled_at <= now)
            .map(|d| d.notification_id)
            .collect();
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for id in due {
            if seen.insert(id) {
                self.send(id).await?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// `retry_failed` (spec §4.2): re-sends failed deliveries whose next
    /// backoff window has elapsed.
    pub async fn retry_failed(&self) -> Result<u64, NotificationError> {
        let now = self.services.clock.now();
        let due: Vec<NotificationId> = self
            .services
            .notifications
            .list_failed_deliveries_for_retry()
            .await?
            .into_iter()
            .filter(|d| d.scheduled_at <= now)
            .map(|d| d.notification_id)
            .collect();
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for id in due {
            if seen.insert(id) {
                self.requeue_for_retry(id).await?;
                self.send(id).await?;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn requeue_for_retry(&self, notification_id: NotificationId) -> Result<(), NotificationError> {
        for mut delivery in self
            .services
            .notifications
            .list_deliveries_for_notification(notification_id)
            .await?
        {
            if matches!(delivery.status, DeliveryStatus::Failed)
                && delivery.attempt < NotificationDelivery::MAX_ATTEMPTS
            {
                delivery.status = DeliveryStatus::Pending;
                self.services.notifications.update_delivery(delivery).await?;
            }
        }
        Ok(())
    }

    /// `create_digest` (spec §4.2): idempotent per `(user, period_start)`
    /// unless `force`; aggregates delivered notifications within
    /// `[now - window, now)`.
    pub async fn create_digest(
        &self,
        recipient: UserId,
        frequency: DigestFrequency,
        force: bool,
    ) -> Result<NotificationDigest, NotificationError> {
        let now = self.services.clock.now();
        let window = match frequency {
            DigestFrequency::Realtime => Duration::hours(1),
            DigestFrequency::Hourly => Duration::hours(1),
            DigestFrequency::Daily => Duration::days(1),
            DigestFrequency::Weekly => Duration::weeks(1),
        };
        let period_start = now - window;

        if !force {
            let existing = self
                .services
                .notifications
                .list_digests_for_recipient(recipient)
                .await?
                .into_iter()
                .find(|d| d.period_start == period_start);
            if let Some(digest) = existing {
                return Ok(digest);
            }
        }

        let mut notifications = self
            .services
            .notifications
            .list_for_recipient(recipient)
            .await?
            .into_iter()
            .filter(|n| {
                matches!(n.status, NotificationStatus::Dispatched | NotificationStatus::Delivered)
                    && n.created_at >= period_start
                    && n.created_at < now
            })
            .collect::<Vec<_>>();
        notifications.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.created_at.cmp(&a.created_at)));
        notifications.truncate(5);

        let digest = NotificationDigest {
            id: DigestId::new(),
            recipient_id: recipient,
            notification_ids: notifications.iter().map(|n| n.id).collect(),
            period_start,
            period_end: now,
            sent: false,
            sent_at: None,
        };
        self.services.notifications.insert_digest(digest.clone()).await?;
        Ok(digest)
    }

    /// `mark_read` (spec §4.2/§6): marks one notification read, idempotently.
    pub async fn mark_read(
        &self,
        notification_id: NotificationId,
        recipient: UserId,
    ) -> Result<Notification, NotificationError> {
        let mut notification = self.services.notifications.get(notification_id).await?;
        if notification.recipient_id != recipient {
            return Err(NotificationError::PermissionDenied(
                "notification does not belong to this recipient".into(),
            ));
        }
        if !notification.read {
            notification.read = true;
            notification.read_at = Some(self.services.clock.now());
            notification.updated_at = notification.read_at.unwrap();
            self.services.notifications.update(notification.clone()).await?;
        }
        Ok(notification)
    }

    /// `mark_all_read` (spec §4.2/§6, §8 "idempotence"): marks every unread
    /// notification of `recipient` read; calling it again is a no-op.
    pub async fn mark_all_read(&self, recipient: UserId) -> Result<u64, NotificationError> {
        let now = self.services.clock.now();
        let mut count = 0;
        for mut notification in self.services.notifications.list_for_recipient(recipient).await? {
            if !notification.read {
                notification.read = true;
                notification.read_at = Some(now);
                notification.updated_at = now;
                self.services.notifications.update(notification).await?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// `unread_count` (spec §4.2/§6).
    pub async fn unread_count(&self, recipient: UserId) -> Result<u64, NotificationError> {
        Ok(self
            .services
            .notifications
            .list_for_recipient(recipient)
            .await?
            .iter()
            .filter(|n| !n.read)
            .count() as u64)
    }

    fn allow_send(&self, user_id: UserId, channel: NotificationChannel) -> bool {
        let now = self.services.clock.now();
        let mut entry = self.rate_state.entry((user_id, channel)).or_default();
        entry.retain(|t| now - *t < Duration::hours(1));
        let per_minute = entry.iter().filter(|t| now - **t < Duration::minutes(1)).count();
        if per_minute >= RATE_LIMIT_PER_MINUTE || entry.len() >= RATE_LIMIT_PER_HOUR {
            return false;
        }
        entry.push(now);
        true
    }
}

fn default_preference(user_id: UserId) -> NotificationPreference {
    NotificationPreference {
        user_id,
        enabled_channels: vec![
            NotificationChannel::InApp,
            NotificationChannel::Email,
            NotificationChannel::Push,
        ],
        muted_kinds: Vec::new(),
        digest_frequency: DigestFrequency::Daily,
        quiet_hours_start: None,
        quiet_hours_end: None,
    }
}

fn in_quiet_hours(preference: &NotificationPreference, now: DateTime<Utc>) -> bool {
    use chrono::Timelike;
    let (Some(start), Some(end)) = (preference.quiet_hours_start, preference.quiet_hours_end) else {
        return false;
    };
    let hour = now.hour() as u8;
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Minimal `{{ var }}` substitution against a flat JSON context (spec §4.2).
fn render_template(template: &str, context: &JsonMap<String, JsonValue>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                let value = context
                    .get(key)
                    .map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default();
                out.push_str(&value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::ContractCreated => "contract_created",
        NotificationKind::ContractStateChanged => "contract_state_changed",
        NotificationKind::InvitationSent => "invitation_sent",
        NotificationKind::InvitationAccepted => "invitation_accepted",
        NotificationKind::ObjectionSubmitted => "objection_submitted",
        NotificationKind::ObjectionResolved => "objection_resolved",
        NotificationKind::SignatureRequested => "signature_requested",
        NotificationKind::ContractPublished => "contract_published",
        NotificationKind::MatchRequestReceived => "match_request_received",
        NotificationKind::MatchRequestAccepted => "match_request_accepted",
        NotificationKind::MatchFollowUpReminder => "match_follow_up_reminder",
        NotificationKind::SystemAlert => "system_alert",
    }
}

fn channel_label(channel: NotificationChannel) -> &'static str {
    match channel {
        NotificationChannel::InApp => "in_app",
        NotificationChannel::Email => "email",
        NotificationChannel::Sms => "sms",
        NotificationChannel::Push => "push",
        NotificationChannel::Whatsapp => "whatsapp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_variables_only() {
        let mut ctx = JsonMap::new();
        ctx.insert("name".into(), JsonValue::String("Ana".into()));
        assert_eq!(
            render_template("Hello {{ name }}, see {{ missing }}", &ctx),
            "Hello Ana, see "
        );
    }

    #[test]
    fn quiet_hours_wraps_past_midnight() {
        use chrono::TimeZone;
        let pref = NotificationPreference {
            user_id: UserId::new(),
            enabled_channels: vec![],
            muted_kinds: vec![],
            digest_frequency: DigestFrequency::Daily,
            quiet_hours_start: Some(22),
            quiet_hours_end: Some(6),
        };
        let at_23 = Utc.with_ymd_and_hms(2026, 1, 1, 23, 0, 0).unwrap();
        let at_10 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        assert!(in_quiet_hours(&pref, at_23));
        assert!(!in_quiet_hours(&pref, at_10));
    }
}
