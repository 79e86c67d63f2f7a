// Path: crates/storage/src/notification.rs
//! In-memory reference implementation of [`NotificationStore`] (spec §4.2).

use async_trait::async_trait;
use dashmap::DashMap;
use rental_api::ports::NotificationStore;
use rental_types::error::StoreError;
use rental_types::ids::{DeliveryId, DigestId, NotificationId, UserId};
use rental_types::notification::{
    Notification, NotificationDelivery, NotificationDigest, NotificationPreference,
};

type StoreResult<T> = Result<T, StoreError>;

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: DashMap<NotificationId, Notification>,
    deliveries: DashMap<DeliveryId, NotificationDelivery>,
    preferences: DashMap<UserId, NotificationPreference>,
    digests: DashMap<DigestId, NotificationDigest>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> StoreResult<()> {
        self.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn get(&self, id: NotificationId) -> StoreResult<Notification> {
        self.notifications
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update(&self, notification: Notification) -> StoreResult<()> {
        if !self.notifications.contains_key(&notification.id) {
            return Err(StoreError::NotFound(notification.id.to_string()));
        }
        self.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn list_for_recipient(&self, recipient_id: UserId) -> StoreResult<Vec<Notification>> {
        Ok(self
            .notifications
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn insert_delivery(&self, delivery: NotificationDelivery) -> StoreResult<()> {
        self.deliveries.insert(delivery.id, delivery);
        Ok(())
    }

    async fn update_delivery(&self, delivery: NotificationDelivery) -> StoreResult<()> {
        if !self.deliveries.contains_key(&delivery.id) {
            return Err(StoreError::NotFound(delivery.id.to_string()));
        }
        self.deliveries.insert(delivery.id, delivery);
        Ok(())
    }

    async fn list_pending_deliveries(&self) -> StoreResult<Vec<NotificationDelivery>> {
        use rental_types::notification::DeliveryStatus;
        Ok(self
            .deliveries
            .iter()
            .filter(|r| matches!(r.status, DeliveryStatus::Pending))
            .map(|r| r.clone())
            .collect())
    }

    async fn list_failed_deliveries_for_retry(&self) -> StoreResult<Vec<NotificationDelivery>> {
        use rental_types::notification::DeliveryStatus;
        use rental_types::notification::NotificationDelivery as Delivery;
        Ok(self
            .deliveries
            .iter()
            .filter(|r| {
                matches!(r.status, DeliveryStatus::Failed | DeliveryStatus::Bounced)
                    && r.attempt < Delivery::MAX_ATTEMPTS
            })
            .map(|r| r.clone())
            .collect())
    }

    async fn list_deliveries_for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<NotificationDelivery>> {
        Ok(self
            .deliveries
            .iter()
            .filter(|r| r.notification_id == notification_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn get_preference(&self, user_id: UserId) -> StoreResult<NotificationPreference> {
        self.preferences
            .get(&user_id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    async fn upsert_preference(&self, preference: NotificationPreference) -> StoreResult<()> {
        self.preferences.insert(preference.user_id, preference);
        Ok(())
    }

    async fn insert_digest(&self, digest: NotificationDigest) -> StoreResult<()> {
        self.digests.insert(digest.id, digest);
        Ok(())
    }

    async fn get_digest(&self, id: DigestId) -> StoreResult<NotificationDigest> {
        self.digests
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_digest(&self, digest: NotificationDigest) -> StoreResult<()> {
        if !self.digests.contains_key(&digest.id) {
            return Err(StoreError::NotFound(digest.id.to_string()));
        }
        self.digests.insert(digest.id, digest);
        Ok(())
    }

    async fn list_digests_for_recipient(&self, recipient_id: UserId) -> StoreResult<Vec<NotificationDigest>> {
        Ok(self
            .digests
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .map(|r| r.clone())
            .collect())
    }
}
