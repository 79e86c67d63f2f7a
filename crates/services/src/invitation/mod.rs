// Path: crates/services/src/invitation/mod.rs
//! The invitation token subsystem (C5, spec §4.5).

use crate::contract::ContractWorkflow;
use chrono::Duration;
use rental_api::Services;
use rental_crypto::{hash_token, is_well_formed_token, new_token};
use rental_types::contract::{ContractState, Role};
use rental_types::error::InvitationError;
use rental_types::history::ActionType;
use rental_types::ids::{ContractId, InvitationId, UserId};
use rental_types::invitation::{Invitation, InvitationMethod, InvitationPublicView, InvitationStatus};
use rental_types::notification::{ContentRef, NotificationKind, NotificationPriority};
use tracing::info;

/// Default invitation lifetime (spec §4.5: `ttl_days=7`).
pub const DEFAULT_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct InvitationSubsystem {
    services: Services,
    workflow: ContractWorkflow,
}

impl InvitationSubsystem {
    pub fn new(services: Services, workflow: ContractWorkflow) -> Self {
        Self { services, workflow }
    }

    /// `create` (spec §4.5): allowed while the contract is still collecting
    /// the landlord side of the deal. Supplements the prose's narrower
    /// `{DRAFT, TENANT_INVITED}` precondition with `LANDLORD_COMPLETING`,
    /// matching the edge the transition table (§4.8) actually specifies for
    /// this action (see `DESIGN.md`).
    pub async fn create(
        &self,
        contract_id: ContractId,
        landlord: UserId,
        tenant_email: String,
        tenant_phone: Option<String>,
        tenant_name: String,
        method: InvitationMethod,
        personal_message: Option<String>,
        ttl_days: i64,
    ) -> Result<(Invitation, String), InvitationError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        if contract.landlord_id != landlord {
            return Err(InvitationError::PermissionDenied(
                "only the landlord may send an invitation".into(),
            ));
        }
        if !matches!(
            contract.current_state,
            ContractState::Draft | ContractState::LandlordCompleting | ContractState::TenantInvited
        ) {
            return Err(InvitationError::InvalidTransition(format!(
                "cannot invite a tenant from {}",
                contract.current_state
            )));
        }

        let now = self.services.clock.now();
        let token = new_token();
        let invitation = Invitation {
            id: InvitationId::new(),
            contract_id,
            token_hash: token.hash,
            tenant_email: tenant_email.clone(),
            tenant_phone,
            tenant_name,
            method,
            personal_message,
            status: InvitationStatus::Sent,
            attempts: 1,
            created_at: now,
            sent_at: Some(now),
            opened_at: None,
            accepted_at: None,
            expires_at: now + Duration::days(ttl_days),
            last_resent_at: None,
            error_message: None,
            created_by: landlord,
            accepted_by: None,
        };
        self.services.invitations.insert(invitation.clone()).await?;

        let from = contract.current_state;
        if from != ContractState::TenantInvited {
            contract.current_state = ContractState::TenantInvited;
            self.workflow
                .commit(
                    contract,
                    ActionType::InvitationSent,
                    format!("invitation sent to {tenant_email}"),
                    Some(from),
                    Some(ContractState::TenantInvited),
                    Default::default(),
                    landlord,
                    Role::Landlord,
                )
                .await?;
        }

        info!(contract_id = %contract_id, invitation_id = %invitation.id, "invitation created");
        Ok((invitation, token.plaintext))
    }

    /// `verify` (spec §4.5): format check, hash lookup, expiry/acceptance
    /// checks, and the `sent -> opened` transition. Returns the public,
    /// token-free view.
    pub async fn verify(&self, plaintext: &str) -> Result<InvitationPublicView, InvitationError> {
        if !is_well_formed_token(plaintext) {
            return Err(InvitationError::MalformedToken);
        }
        let hash = hash_token(plaintext);
        let mut invitation = self
            .services
            .invitations
            .get_by_token_hash(&hash)
            .await
            .map_err(|_| InvitationError::MalformedToken)?;

        let now = self.services.clock.now();
        if invitation.status == InvitationStatus::Accepted {
            return Err(InvitationError::AlreadyAccepted);
        }
        if invitation.expires_at <= now || invitation.status == InvitationStatus::Expired {
            if invitation.status != InvitationStatus::Expired {
                invitation.status = InvitationStatus::Expired;
                self.services.invitations.update(invitation).await?;
            }
            return Err(InvitationError::Expired);
        }
        if invitation.status == InvitationStatus::Sent {
            invitation.status = InvitationStatus::Opened;
            invitation.opened_at = Some(now);
            self.services.invitations.update(invitation.clone()).await?;
        }

        let contract = self.services.contracts.get(invitation.contract_id).await?;
        let monthly_rent = contract
            .economic_terms
            .get("monthly_rent")
            .and_then(decimal_from_json);
        let landlord_display_name = self
            .services
            .user_directory
            .display_name(contract.landlord_id)
            .await
            .unwrap_or_else(|| "landlord".to_string());
        let property_address = contract
            .property_data
            .get("address")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(InvitationPublicView {
            contract_id: invitation.contract_id,
            property_address,
            monthly_rent,
            landlord_display_name,
            expires_at: invitation.expires_at,
        })
    }

    /// `accept` (spec §4.5): verifies, checks email match, links the tenant,
    /// and transitions `TENANT_INVITED -> TENANT_REVIEWING`.
    pub async fn accept(
        &self,
        plaintext: &str,
        tenant_user: UserId,
        tenant_email: &str,
    ) -> Result<Invitation, InvitationError> {
        if !is_well_formed_token(plaintext) {
            return Err(InvitationError::MalformedToken);
        }
        let hash = hash_token(plaintext);
        let mut invitation = self
            .services
            .invitations
            .get_by_token_hash(&hash)
            .await
            .map_err(|_| InvitationError::MalformedToken)?;

        let now = self.services.clock.now();
        if invitation.status == InvitationStatus::Accepted {
            return Err(InvitationError::AlreadyAccepted);
        }
        if invitation.expires_at <= now {
            invitation.status = InvitationStatus::Expired;
            self.services.invitations.update(invitation).await?;
            return Err(InvitationError::Expired);
        }
        if !matches!(invitation.status, InvitationStatus::Sent | InvitationStatus::Opened) {
            return Err(InvitationError::InvalidTransition(format!(
                "cannot accept invitation in status {:?}",
                invitation.status
            )));
        }
        if !tenant_email.eq_ignore_ascii_case(&invitation.tenant_email) {
            return Err(InvitationError::EmailMismatch);
        }

        let mut contract = self.services.contracts.get(invitation.contract_id).await?;
        if contract.current_state != ContractState::TenantInvited {
            return Err(InvitationError::InvalidTransition(format!(
                "contract is in {}, not TENANT_INVITED",
                contract.current_state
            )));
        }

        invitation.status = InvitationStatus::Accepted;
        invitation.accepted_at = Some(now);
        invitation.accepted_by = Some(tenant_user);
        self.services.invitations.update(invitation.clone()).await?;

        contract.tenant_id = Some(tenant_user);
        let landlord_id = contract.landlord_id;
        let contract_number = contract.contract_number;
        let from = contract.current_state;
        contract.current_state = ContractState::TenantReviewing;
        let contract = self
            .workflow
            .commit(
                contract,
                ActionType::InvitationAccepted,
                "invitation accepted, tenant linked".into(),
                Some(from),
                Some(ContractState::TenantReviewing),
                Default::default(),
                tenant_user,
                Role::Tenant,
            )
            .await?;

        self.workflow
            .notify(
                landlord_id,
                NotificationKind::InvitationAccepted,
                "Invitation accepted",
                &format!("The tenant has accepted your invitation for contract {contract_number}."),
                NotificationPriority::Normal,
                ContentRef::Contract { id: contract.id },
            )
            .await;

        info!(invitation_id = %invitation.id, "invitation accepted");
        Ok(invitation)
    }

    /// `resend` (spec §4.5): rotates the token of the most recent
    /// non-terminal invitation, bumping `attempts` and `last_resent_at`.
    pub async fn resend(
        &self,
        contract_id: ContractId,
        landlord: UserId,
    ) -> Result<(Invitation, String), InvitationError> {
        let contract = self.services.contracts.get(contract_id).await?;
        if contract.landlord_id != landlord {
            return Err(InvitationError::PermissionDenied(
                "only the landlord may resend an invitation".into(),
            ));
        }
        let mut candidates = self.services.invitations.list_for_contract(contract_id).await?;
        candidates.retain(|i| matches!(i.status, InvitationStatus::Sent | InvitationStatus::Opened));
        candidates.sort_by_key(|i| i.created_at);
        let mut latest = candidates
            .pop()
            .ok_or(InvitationError::NotFound)?;

        let now = self.services.clock.now();
        if latest.expires_at <= now {
            return Err(InvitationError::Expired);
        }

        let token = new_token();
        latest.token_hash = token.hash;
        latest.attempts += 1;
        latest.last_resent_at = Some(now);
        self.services.invitations.update(latest.clone()).await?;

        self.workflow
            .notify(
                landlord,
                NotificationKind::InvitationSent,
                "Invitation resent",
                &format!("A new invitation link was sent to {}.", latest.tenant_email),
                NotificationPriority::Low,
                ContentRef::Contract { id: contract_id },
            )
            .await;

        info!(invitation_id = %latest.id, "invitation resent");
        Ok((latest, token.plaintext))
    }

    /// `cleanup_expired` (spec §4.5, §8 "idempotence"): bulk-expires every
    /// non-terminal invitation past its `expires_at`.
    pub async fn cleanup_expired(&self) -> Result<u64, InvitationError> {
        let now = self.services.clock.now();
        let expired = self.services.invitations.list_expired_before(now).await?;
        let mut count = 0;
        for mut invitation in expired {
            if invitation.status != InvitationStatus::Expired {
                invitation.status = InvitationStatus::Expired;
                self.services.invitations.update(invitation).await?;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Parses a JSON-encoded economic term (string or number) into a `Decimal`.
fn decimal_from_json(value: &serde_json::Value) -> Option<rust_decimal::Decimal> {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        _ => None,
    }
}
