// Path: crates/services/src/objection/mod.rs
//! The objection / negotiation engine (C6, spec §4.6).

use crate::common::{apply_field, contract_role, resolve_field};
use crate::contract::ContractWorkflow;
use rental_api::Services;
use rental_types::contract::{ContractState, Role};
use rental_types::error::ObjectionError;
use rental_types::history::ActionType;
use rental_types::ids::{ContractId, ObjectionId, UserId};
use rental_types::notification::{ContentRef, NotificationKind, NotificationPriority};
use rental_types::objection::{Objection, ObjectionPriority, ObjectionResponse, ObjectionStatus};
use serde_json::Value as JsonValue;
use tracing::info;

#[derive(Clone)]
pub struct ObjectionEngine {
    services: Services,
    workflow: ContractWorkflow,
}

impl ObjectionEngine {
    pub fn new(services: Services, workflow: ContractWorkflow) -> Self {
        Self { services, workflow }
    }

    /// `submit` (spec §4.6). Supplements the prose's three listed source
    /// states with `BOTH_REVIEWING`, matching the `-> OBJECTIONS_PENDING`
    /// edge the transition table grants it (see `DESIGN.md`).
    #[allow(clippy::too_many_arguments)]
    pub async fn submit(
        &self,
        contract_id: ContractId,
        user: UserId,
        field_reference: String,
        current_value: JsonValue,
        proposed_value: JsonValue,
        justification: String,
        priority: ObjectionPriority,
    ) -> Result<Objection, ObjectionError> {
        if justification.chars().count() < Objection::MIN_JUSTIFICATION_LEN {
            return Err(ObjectionError::Validation(format!(
                "justification must be at least {} characters",
                Objection::MIN_JUSTIFICATION_LEN
            )));
        }
        let mut contract = self.services.contracts.get(contract_id).await?;
        let role = match contract_role(&contract, user) {
            Some(Role::Landlord) => Role::Landlord,
            Some(Role::Tenant) => Role::Tenant,
            _ => {
                return Err(ObjectionError::PermissionDenied(
                    "only the landlord or tenant may raise an objection".into(),
                ))
            }
        };
        if !matches!(
            contract.current_state,
            ContractState::LandlordReviewing
                | ContractState::TenantReviewing
                | ContractState::ObjectionsPending
                | ContractState::BothReviewing
        ) {
            return Err(ObjectionError::InvalidTransition(format!(
                "cannot raise an objection from {}",
                contract.current_state
            )));
        }

        let now = self.services.clock.now();
        let objection = Objection {
            id: ObjectionId::new(),
            contract_id,
            objected_by: user,
            objector_role: role,
            field_reference,
            current_value,
            proposed_value,
            justification,
            priority,
            status: ObjectionStatus::Pending,
            responder: None,
            response_note: None,
            counter_proposal: None,
            requires_manual_amendment: false,
            submitted_at: now,
            reviewed_at: None,
            resolved_at: None,
        };
        self.services.objections.insert(objection.clone()).await?;

        contract.objections_count += 1;
        contract.has_pending_objections = true;
        contract.last_objection_date = Some(now);

        let from = contract.current_state;
        if from != ContractState::ObjectionsPending {
            contract.current_state = ContractState::ObjectionsPending;
        }
        let counterparty = match role {
            Role::Landlord => contract.tenant_id,
            _ => Some(contract.landlord_id),
        };

        let contract = self
            .workflow
            .commit(
                contract,
                ActionType::ObjectionSubmitted,
                format!("objection raised on {}", objection.field_reference),
                Some(from),
                Some(ContractState::ObjectionsPending).filter(|_| from != ContractState::ObjectionsPending),
                Default::default(),
                user,
                role,
            )
            .await?;

        if let Some(counterparty) = counterparty {
            self.workflow
                .notify(
                    counterparty,
                    NotificationKind::ObjectionSubmitted,
                    "New objection raised",
                    &format!("An objection was raised on {}.", objection.field_reference),
                    NotificationPriority::Normal,
                    ContentRef::Objection { id: objection.id },
                )
                .await;
        }

        info!(contract_id = %contract_id, objection_id = %objection.id, "objection submitted");
        Ok(objection)
    }

    /// `respond` (spec §4.6). On `ACCEPTED`, atomically applies the proposed
    /// value against the contract's known targets; an unknown path is
    /// flagged `requires_manual_amendment` rather than rejected (spec §9).
    pub async fn respond(
        &self,
        objection_id: ObjectionId,
        user: UserId,
        response: ObjectionResponse,
        note: Option<String>,
    ) -> Result<Objection, ObjectionError> {
        let mut objection = self.services.objections.get(objection_id).await?;
        if objection.objected_by == user {
            return Err(ObjectionError::PermissionDenied(
                "the objector may not respond to their own objection".into(),
            ));
        }
        let mut contract = self.services.contracts.get(objection.contract_id).await?;
        let role = match contract_role(&contract, user) {
            Some(Role::Landlord) => Role::Landlord,
            Some(Role::Tenant) => Role::Tenant,
            _ => {
                return Err(ObjectionError::PermissionDenied(
                    "only the landlord or tenant may respond to an objection".into(),
                ))
            }
        };
        if !objection.status.is_pending() {
            return Err(ObjectionError::InvalidTransition(
                "objection has already been resolved".into(),
            ));
        }

        let now = self.services.clock.now();
        objection.responder = Some(user);
        objection.response_note = note;
        objection.reviewed_at = Some(now);

        let mut changes = serde_json::Map::new();
        match response {
            ObjectionResponse::Accepted => {
                objection.status = ObjectionStatus::Accepted;
                objection.resolved_at = Some(now);
                let applied = apply_field(
                    &mut contract,
                    &objection.field_reference,
                    objection.proposed_value.clone(),
                );
                if applied {
                    changes.insert(
                        objection.field_reference.clone(),
                        objection.proposed_value.clone(),
                    );
                } else {
                    objection.requires_manual_amendment = true;
                    let manual_note = "field path not recognised, requires manual amendment";
                    objection.response_note = Some(match objection.response_note.take() {
                        Some(existing) => format!("{existing}; {manual_note}"),
                        None => manual_note.to_string(),
                    });
                }
            }
            ObjectionResponse::Rejected => {
                objection.status = ObjectionStatus::Rejected;
                objection.resolved_at = Some(now);
            }
        }
        self.services.objections.update(objection.clone()).await?;

        let remaining = self
            .services
            .objections
            .list_for_contract(objection.contract_id)
            .await?
            .iter()
            .filter(|o| o.status.is_pending())
            .count();
        contract.has_pending_objections = remaining > 0;

        let from = contract.current_state;
        let to_state = if remaining == 0
            && matches!(
                from,
                ContractState::ObjectionsPending | ContractState::NegotiationInProgress
            ) {
            Some(ContractState::BothReviewing)
        } else {
            None
        };
        if let Some(to) = to_state {
            contract.current_state = to;
        }

        self.workflow
            .commit(
                contract,
                ActionType::ObjectionResponded,
                format!("objection {response:?} on {}", objection.field_reference),
                Some(from),
                to_state,
                changes,
                user,
                role,
            )
            .await?;

        self.workflow
            .notify(
                objection.objected_by,
                NotificationKind::ObjectionResolved,
                "Objection resolved",
                &format!("Your objection on {} was {response:?}.", objection.field_reference),
                NotificationPriority::Normal,
                ContentRef::Objection { id: objection.id },
            )
            .await;

        info!(objection_id = %objection.id, ?response, "objection responded");
        Ok(objection)
    }

    /// Registers a counter-proposal without resolving the objection,
    /// entering the multi-round negotiation state (spec §4.8,
    /// `OBJECTIONS_PENDING -> NEGOTIATION_IN_PROGRESS`; not named as a
    /// distinct operation in §4.6 but required to make that state reachable).
    pub async fn counter(
        &self,
        objection_id: ObjectionId,
        user: UserId,
        counter_proposal: JsonValue,
    ) -> Result<Objection, ObjectionError> {
        let mut objection = self.services.objections.get(objection_id).await?;
        if objection.objected_by == user {
            return Err(ObjectionError::PermissionDenied(
                "the objector may not counter their own objection".into(),
            ));
        }
        if !objection.status.is_pending() {
            return Err(ObjectionError::InvalidTransition(
                "objection has already been resolved".into(),
            ));
        }
        let mut contract = self.services.contracts.get(objection.contract_id).await?;
        let role = contract_role(&contract, user).ok_or_else(|| {
            ObjectionError::PermissionDenied("not a party to this contract".into())
        })?;

        objection.status = ObjectionStatus::UnderReview;
        objection.counter_proposal = Some(counter_proposal);
        objection.reviewed_at = Some(self.services.clock.now());
        self.services.objections.update(objection.clone()).await?;

        let from = contract.current_state;
        if from == ContractState::ObjectionsPending {
            contract.current_state = ContractState::NegotiationInProgress;
            self.workflow
                .commit(
                    contract,
                    ActionType::ObjectionResponded,
                    "counter-proposal registered".into(),
                    Some(from),
                    Some(ContractState::NegotiationInProgress),
                    Default::default(),
                    user,
                    role,
                )
                .await?;
        }

        Ok(objection)
    }

    /// Withdraws an objection at the objector's own request (spec §3: the
    /// status enum includes `withdrawn` as a forward-only terminal state).
    pub async fn withdraw(&self, objection_id: ObjectionId, user: UserId) -> Result<Objection, ObjectionError> {
        let mut objection = self.services.objections.get(objection_id).await?;
        if objection.objected_by != user {
            return Err(ObjectionError::PermissionDenied(
                "only the objector may withdraw their objection".into(),
            ));
        }
        if !objection.status.is_pending() {
            return Err(ObjectionError::InvalidTransition(
                "objection has already been resolved".into(),
            ));
        }
        let mut contract = self.services.contracts.get(objection.contract_id).await?;
        let role = contract_role(&contract, user).ok_or_else(|| {
            ObjectionError::PermissionDenied("not a party to this contract".into())
        })?;

        objection.status = ObjectionStatus::Withdrawn;
        objection.resolved_at = Some(self.services.clock.now());
        self.services.objections.update(objection.clone()).await?;

        let remaining = self
            .services
            .objections
            .list_for_contract(objection.contract_id)
            .await?
            .iter()
            .filter(|o| o.status.is_pending())
            .count();
        contract.has_pending_objections = remaining > 0;

        let from = contract.current_state;
        let to_state = if remaining == 0
            && matches!(
                from,
                ContractState::ObjectionsPending | ContractState::NegotiationInProgress
            ) {
            Some(ContractState::BothReviewing)
        } else {
            None
        };
        if let Some(to) = to_state {
            contract.current_state = to;
        }

        self.workflow
            .commit(
                contract,
                ActionType::ObjectionResponded,
                format!("objection withdrawn on {}", objection.field_reference),
                Some(from),
                to_state,
                Default::default(),
                user,
                role,
            )
            .await?;

        Ok(objection)
    }

    /// Pending objections older than 5 days (spec §4.6, observable only).
    pub async fn overdue_for_contract(&self, contract_id: ContractId) -> Result<Vec<Objection>, ObjectionError> {
        let now = self.services.clock.now();
        Ok(self
            .services
            .objections
            .list_for_contract(contract_id)
            .await?
            .into_iter()
            .filter(|o| o.is_overdue(now))
            .collect())
    }

    /// Exposes `resolve_field` for transport-layer previews of a proposed
    /// amendment before it is submitted.
    pub async fn preview_current_value(
        &self,
        contract_id: ContractId,
        field_reference: &str,
    ) -> Result<Option<JsonValue>, ObjectionError> {
        let contract = self.services.contracts.get(contract_id).await?;
        Ok(resolve_field(&contract, field_reference))
    }
}
