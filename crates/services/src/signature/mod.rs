// Path: crates/services/src/signature/mod.rs
//! Ordered signing and publication (C7, spec §4.7).

use crate::common::contract_role;
use crate::contract::ContractWorkflow;
use chrono::{Months, Utc};
use rental_api::Services;
use rental_types::auth::{auth_satisfies, required_level, AuthLevel, AuthMethod};
use rental_types::contract::{ContractState, PartyStatus, Role, SignaturePayload};
use rental_types::error::SignatureError;
use rental_types::history::ActionType;
use rental_types::ids::{ContractId, UserId};
use rental_types::notification::{ContentRef, NotificationKind, NotificationPriority};
use serde_json::Map as JsonMap;
use tracing::info;

/// Everything needed to record one party's signing attempt.
pub struct SigningAttempt {
    pub methods: Vec<AuthMethod>,
    pub user_agent: String,
    pub ip_address: String,
    pub biometric_payload: Option<Vec<u8>>,
    pub device_fingerprint: Option<String>,
}

#[derive(Clone)]
pub struct SignatureFlow {
    services: Services,
    workflow: ContractWorkflow,
}

impl SignatureFlow {
    pub fn new(services: Services, workflow: ContractWorkflow) -> Self {
        Self { services, workflow }
    }

    /// The role expected to sign next: tenant, then guarantor (if the
    /// contract has one), then landlord (spec §4.7, "ordered signing").
    fn expected_next(contract: &rental_types::contract::Contract) -> Role {
        if !contract.tenant.signed {
            Role::Tenant
        } else if contract.has_guarantor() && !contract.guarantor.signed {
            Role::Guarantor
        } else {
            Role::Landlord
        }
    }

    fn all_signed(contract: &rental_types::contract::Contract) -> bool {
        contract.tenant.signed
            && contract.landlord.signed
            && (!contract.has_guarantor() || contract.guarantor.signed)
    }

    /// `sign` (spec §4.7): only valid in `READY_TO_SIGN`, only for the party
    /// whose turn it is, and only once that party's presented auth methods
    /// satisfy the ladder for this contract (`maximum` when a guarantor is
    /// attached, `basic` otherwise).
    pub async fn sign(
        &self,
        contract_id: ContractId,
        actor: UserId,
        attempt: SigningAttempt,
    ) -> Result<rental_types::contract::Contract, SignatureError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        if contract.current_state != ContractState::ReadyToSign {
            return Err(SignatureError::InvalidTransition(format!(
                "cannot sign from {}",
                contract.current_state
            )));
        }
        let role = contract_role(&contract, actor).ok_or_else(|| {
            SignatureError::PermissionDenied("actor is not a party to this contract".into())
        })?;

        let expected = Self::expected_next(&contract);
        if role != expected {
            return Err(SignatureError::OutOfOrder(
                expected.to_string(),
                role.to_string(),
            ));
        }

        let required = required_level(contract.has_guarantor());
        if !auth_satisfies(&attempt.methods, required) {
            return Err(SignatureError::InsufficientAuth {
                provided: describe_methods(&attempt.methods),
                required: describe_level(required),
            });
        }

        let now = self.services.clock.now();
        let payload = SignaturePayload {
            signed_at: now,
            user_agent: attempt.user_agent,
            ip_address: attempt.ip_address,
            biometric_payload: attempt.biometric_payload,
            device_fingerprint: attempt.device_fingerprint,
        };
        let status = PartyStatus {
            approved: true,
            approved_at: Some(now),
            signed: true,
            signed_at: Some(now),
            signature: Some(payload),
        };
        match role {
            Role::Tenant => contract.tenant = status,
            Role::Guarantor => contract.guarantor = status,
            Role::Landlord => contract.landlord = status,
            _ => unreachable!("expected_next only returns party roles"),
        }

        contract = self
            .workflow
            .commit(
                contract,
                ActionType::PartySigned,
                format!("{role} signed"),
                None,
                None,
                JsonMap::new(),
                actor,
                role,
            )
            .await?;

        if Self::all_signed(&contract) {
            let from = contract.current_state;
            contract.current_state = ContractState::FullySigned;
            contract = self
                .workflow
                .commit(
                    contract,
                    ActionType::ContractFullySigned,
                    "all required signatures collected".into(),
                    Some(from),
                    Some(ContractState::FullySigned),
                    JsonMap::new(),
                    actor,
                    Role::System,
                )
                .await?;
            info!(contract_id = %contract_id, "contract fully signed");

            for recipient in all_party_ids(&contract) {
                self.workflow
                    .notify(
                        recipient,
                        NotificationKind::ContractStateChanged,
                        "Contract fully signed",
                        &format!("Contract {} has been signed by all parties.", contract.contract_number),
                        NotificationPriority::High,
                        ContentRef::Contract { id: contract.id },
                    )
                    .await;
            }
        }

        Ok(contract)
    }

    /// `publish` (spec §4.7): landlord-only, requires `FULLY_SIGNED`. Derives
    /// `start_date`/`end_date` from `contract_terms.lease_duration_months`
    /// and transitions `FULLY_SIGNED -> PUBLISHED`.
    pub async fn publish(
        &self,
        contract_id: ContractId,
        landlord: UserId,
    ) -> Result<rental_types::contract::Contract, SignatureError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        if contract.landlord_id != landlord {
            return Err(SignatureError::PermissionDenied(
                "only the landlord may publish this contract".into(),
            ));
        }
        if contract.current_state != ContractState::FullySigned {
            return Err(SignatureError::InvalidTransition(format!(
                "cannot publish from {}",
                contract.current_state
            )));
        }

        let now = self.services.clock.now();
        let months = contract
            .contract_terms
            .get("lease_duration_months")
            .and_then(|v| v.as_u64())
            .unwrap_or(12) as u32;
        let start_date = now.date_naive();
        let end_date = start_date
            .checked_add_months(Months::new(months))
            .unwrap_or(start_date);

        contract.start_date = Some(start_date);
        contract.end_date = Some(end_date);
        contract.published = true;
        contract.published_at = Some(now);
        contract.published_by = Some(landlord);

        let from = contract.current_state;
        contract.current_state = ContractState::Published;
        let contract = self
            .workflow
            .commit(
                contract,
                ActionType::ContractPublished,
                "contract published".into(),
                Some(from),
                Some(ContractState::Published),
                JsonMap::new(),
                landlord,
                Role::Landlord,
            )
            .await?;

        info!(contract_id = %contract_id, "contract published");

        for recipient in all_party_ids(&contract) {
            self.workflow
                .notify(
                    recipient,
                    NotificationKind::ContractPublished,
                    "Contract published",
                    &format!("Contract {} has been published.", contract.contract_number),
                    NotificationPriority::Normal,
                    ContentRef::Contract { id: contract.id },
                )
                .await;
        }

        Ok(contract)
    }

    /// Activates every published contract whose `start_date` has arrived
    /// (spec §4.8, `PUBLISHED -> ACTIVE`, system-driven sweep).
    pub async fn activate_due(&self) -> Result<u64, SignatureError> {
        let now = self.services.clock.now();
        let due = self.services.contracts.list_starting_before(now).await?;
        let mut count = 0;
        for mut contract in due {
            if contract.current_state == ContractState::Published {
                let from = contract.current_state;
                contract.current_state = ContractState::Active;
                self.workflow
                    .commit(
                        contract,
                        ActionType::StateTransition,
                        "lease start date reached".into(),
                        Some(from),
                        Some(ContractState::Active),
                        JsonMap::new(),
                        system_actor(),
                        Role::System,
                    )
                    .await?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Expires every active contract whose `end_date` has passed (spec
    /// §4.8, `ACTIVE -> EXPIRED`, system-driven sweep).
    pub async fn expire_due(&self) -> Result<u64, SignatureError> {
        let now = self.services.clock.now();
        let due = self.services.contracts.list_expiring_before(now).await?;
        let mut count = 0;
        for mut contract in due {
            if contract.current_state == ContractState::Active {
                let from = contract.current_state;
                contract.current_state = ContractState::Expired;
                self.workflow
                    .commit(
                        contract,
                        ActionType::StateTransition,
                        "lease end date reached".into(),
                        Some(from),
                        Some(ContractState::Expired),
                        JsonMap::new(),
                        system_actor(),
                        Role::System,
                    )
                    .await?;
                count += 1;
            }
        }
        Ok(count)
    }
}

/// A stand-in `UserId` for history entries performed by a scheduler sweep
/// rather than a real party (spec §4.8: `System`-attributed transitions).
fn system_actor() -> UserId {
    UserId::from(uuid::Uuid::nil())
}

fn all_party_ids(contract: &rental_types::contract::Contract) -> Vec<UserId> {
    let mut ids = vec![contract.landlord_id];
    if let Some(tenant_id) = contract.tenant_id {
        ids.push(tenant_id);
    }
    if let Some(guarantor_id) = contract.guarantor_id {
        ids.push(guarantor_id);
    }
    ids
}

fn describe_methods(methods: &[AuthMethod]) -> String {
    methods
        .iter()
        .map(|m| format!("{m:?}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_level(level: AuthLevel) -> String {
    format!("{level:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_signs_before_guarantor_and_landlord() {
        use rental_types::contract::{Contract, ContractType, PartyStatus};
        use rental_types::ids::{ContractId, ContractNumber, PropertyId, UserId};
        use serde_json::Map;

        let contract = Contract {
            id: ContractId::new(),
            contract_number: ContractNumber::new(2025, 1),
            contract_type: ContractType::RentalUrban,
            current_state: ContractState::ReadyToSign,
            landlord_id: UserId::new(),
            tenant_id: Some(UserId::new()),
            guarantor_id: Some(UserId::new()),
            property_id: PropertyId::new(),
            landlord_data: Map::new(),
            tenant_data: Map::new(),
            property_data: Map::new(),
            economic_terms: Map::new(),
            contract_terms: Map::new(),
            special_clauses: Map::new(),
            landlord: PartyStatus::default(),
            tenant: PartyStatus::default(),
            guarantor: PartyStatus::default(),
            published: false,
            published_at: None,
            published_by: None,
            start_date: None,
            end_date: None,
            pdf_handle: None,
            objections_count: 0,
            has_pending_objections: false,
            last_objection_date: None,
            history: Vec::new(),
            guarantees: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(SignatureFlow::expected_next(&contract), Role::Tenant);
    }
}
