// Path: crates/storage/src/fakes.rs
//! Fakes for the adapter ports (spec §6). These are not mocks: they perform
//! real (if trivial) logic — recording what was sent, rendering a minimal
//! placeholder document — so service-layer tests exercise real control
//! flow rather than asserting on call counts.

use async_trait::async_trait;
use parking_lot::Mutex;
use rental_api::ports::{ChannelAdapterPort, DeliveryOutcome, PdfRendererPort, UserDirectoryPort};
use rental_types::contract::{Contract, Role};
use rental_types::ids::UserId;
use rental_types::notification::NotificationChannel;
use std::collections::HashMap;

/// Records every send attempt in order; `fail_channel` lets a test force a
/// specific channel to report delivery failure (spec §8, retry scenarios).
#[derive(Default)]
pub struct RecordingChannelAdapter {
    pub sent: Mutex<Vec<(NotificationChannel, UserId, String)>>,
    pub fail_channels: Mutex<Vec<NotificationChannel>>,
}

impl RecordingChannelAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, channel: NotificationChannel) {
        self.fail_channels.lock().push(channel);
    }
}

#[async_trait]
impl ChannelAdapterPort for RecordingChannelAdapter {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient_id: UserId,
        title: &str,
        body: &str,
    ) -> DeliveryOutcome {
        self.sent
            .lock()
            .push((channel, recipient_id, format!("{title}: {body}")));
        if self.fail_channels.lock().contains(&channel) {
            DeliveryOutcome {
                delivered: false,
                error: Some("simulated channel failure".into()),
            }
        } else {
            DeliveryOutcome {
                delivered: true,
                error: None,
            }
        }
    }
}

/// Renders a minimal placeholder PDF body; a real implementation would
/// render the contract's full text (spec §4.7, "publication").
#[derive(Default)]
pub struct PlaceholderPdfRenderer;

#[async_trait]
impl PdfRendererPort for PlaceholderPdfRenderer {
    async fn render(&self, contract: &Contract) -> Result<Vec<u8>, String> {
        Ok(format!(
            "RENTAL CONTRACT {}\nstate={:?}\n",
            contract.contract_number, contract.current_state
        )
        .into_bytes())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// An in-memory user directory fake, seeded by tests (spec §6, "User
/// directory is owned by an external identity service").
#[derive(Default)]
pub struct InMemoryUserDirectory {
    entries: Mutex<HashMap<UserId, DirectoryEntry>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, user_id: UserId, entry: DirectoryEntry) {
        self.entries.lock().insert(user_id, entry);
    }
}

#[async_trait]
impl UserDirectoryPort for InMemoryUserDirectory {
    async fn display_name(&self, user_id: UserId) -> Option<String> {
        self.entries.lock().get(&user_id).map(|e| e.display_name.clone())
    }

    async fn email(&self, user_id: UserId) -> Option<String> {
        self.entries.lock().get(&user_id).map(|e| e.email.clone())
    }

    async fn phone(&self, user_id: UserId) -> Option<String> {
        self.entries.lock().get(&user_id).and_then(|e| e.phone.clone())
    }

    async fn role_in_contract(&self, user_id: UserId, contract: &Contract) -> Option<Role> {
        if user_id == contract.landlord_id {
            Some(Role::Landlord)
        } else if contract.tenant_id == Some(user_id) {
            Some(Role::Tenant)
        } else if contract.guarantor_id == Some(user_id) {
            Some(Role::Guarantor)
        } else {
            None
        }
    }
}
