// Path: crates/api/src/services.rs
//! Explicit dependency injection for the rental contract engine: every
//! collaborator a workflow needs is an `Arc<dyn Trait>` field on [`Services`],
//! constructed once at startup (mirroring the node binary's explicit
//! `Arc<dyn ...>` wiring) rather than resolved through a global registry.

use crate::ports::{
    ChannelAdapterPort, ClockPort, ContractStore, GuaranteeStore, InvitationStore, MatchStore,
    NotificationStore, ObjectionStore, PdfRendererPort, UserDirectoryPort,
};
use std::sync::Arc;

/// The full set of collaborators shared by every `rental-services` workflow.
#[derive(Clone)]
pub struct Services {
    pub clock: Arc<dyn ClockPort>,
    pub contracts: Arc<dyn ContractStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub objections: Arc<dyn ObjectionStore>,
    pub guarantees: Arc<dyn GuaranteeStore>,
    pub matches: Arc<dyn MatchStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub channel_adapter: Arc<dyn ChannelAdapterPort>,
    pub pdf_renderer: Arc<dyn PdfRendererPort>,
    pub user_directory: Arc<dyn UserDirectoryPort>,
}

impl Services {
    /// Assembles a `Services` aggregate from already-constructed ports.
    /// Kept as a plain constructor (no builder) since every field is
    /// mandatory: a partially wired engine cannot serve any workflow.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Arc<dyn ClockPort>,
        contracts: Arc<dyn ContractStore>,
        invitations: Arc<dyn InvitationStore>,
        objections: Arc<dyn ObjectionStore>,
        guarantees: Arc<dyn GuaranteeStore>,
        matches: Arc<dyn MatchStore>,
        notifications: Arc<dyn NotificationStore>,
        channel_adapter: Arc<dyn ChannelAdapterPort>,
        pdf_renderer: Arc<dyn PdfRendererPort>,
        user_directory: Arc<dyn UserDirectoryPort>,
    ) -> Self {
        Self {
            clock,
            contracts,
            invitations,
            objections,
            guarantees,
            matches,
            notifications,
            channel_adapter,
            pdf_renderer,
            user_directory,
        }
    }
}
