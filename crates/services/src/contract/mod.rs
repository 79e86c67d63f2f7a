// Path: crates/services/src/contract/mod.rs
//! The contract store and workflow coordinator (C4, C8): entity creation,
//! data completion, approvals, and the authoritative state machine.

mod transitions;

use crate::common::contract_role;
use crate::notification::{NotificationDispatcher, NotificationRequest};
use chrono::Datelike;
use rental_api::Services;
use rental_types::contract::{Contract, ContractState, ContractType, PartyStatus, Role};
use rental_types::error::ContractError;
use rental_types::history::{ActionType, HistoryMetadata, WorkflowHistoryEntry};
use rental_types::ids::{ContractId, HistoryEntryId, PropertyId, UserId};
use rental_types::notification::{ContentRef, NotificationKind, NotificationPriority};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub use transitions::{is_allowed, responsible_party};

/// Coordinates the contract entity and its workflow state machine (spec §4.1,
/// §4.4, §4.8). Holds a cheap clone of [`Services`], mirroring how the
/// teacher's per-subsystem handlers are constructed from the shared
/// dependency-injection aggregate rather than threading individual ports.
#[derive(Clone)]
pub struct ContractWorkflow {
    services: Services,
    notifier: NotificationDispatcher,
}

impl ContractWorkflow {
    pub fn new(services: Services) -> Self {
        let notifier = NotificationDispatcher::new(services.clone());
        Self { services, notifier }
    }

    /// Best-effort notification dispatch: a failure here is logged and never
    /// propagated, matching the rule that external delivery failures must
    /// not fail the originating business operation (spec §7, "Propagation").
    pub(crate) async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: &str,
        body: &str,
        priority: NotificationPriority,
        content_ref: ContentRef,
    ) {
        let request = NotificationRequest {
            recipient,
            kind,
            title: title.to_string(),
            template: body.to_string(),
            context: JsonMap::new(),
            priority,
            content_ref,
            channels: None,
            scheduled_at: None,
        };
        if let Err(err) = self.notifier.create_notification(request).await {
            warn!(error = %err, recipient = %recipient, "failed to create notification");
        }
    }

    /// Creates a new contract in `DRAFT` (spec §4.1, §4.4). The contract
    /// number is allocated race-safely per calendar year by the store.
    pub async fn create_draft(
        &self,
        landlord_id: UserId,
        contract_type: ContractType,
        property_id: PropertyId,
    ) -> Result<Contract, ContractError> {
        let now = self.services.clock.now();
        let number = self
            .services
            .contracts
            .next_contract_number(Datelike::year(&now))
            .await?;

        let mut contract = Contract {
            id: ContractId::new(),
            contract_number: number,
            contract_type,
            current_state: ContractState::Draft,
            landlord_id,
            tenant_id: None,
            guarantor_id: None,
            property_id,
            landlord_data: JsonMap::new(),
            tenant_data: JsonMap::new(),
            property_data: JsonMap::new(),
            economic_terms: JsonMap::new(),
            contract_terms: JsonMap::new(),
            special_clauses: JsonMap::new(),
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
            created_at: now,
            updated_at: now,
        };

        let entry = self.history_entry(
            &contract,
            ActionType::ContractCreated,
            format!("contract {} created", contract.contract_number),
            None,
            Some(ContractState::Draft),
            JsonMap::new(),
            landlord_id,
            Role::Landlord,
        );
        contract.history.push(entry);

        self.services.contracts.insert(contract.clone()).await?;
        rental_telemetry::contract_metrics().inc_contracts_created(contract_type_label(contract_type));
        info!(contract_id = %contract.id, contract_number = %contract.contract_number, "contract created");
        Ok(contract)
    }

    /// Fills in the landlord's structured payloads and, the first time it is
    /// called, transitions `DRAFT -> LANDLORD_COMPLETING` (spec §4.4, §8
    /// scenario 1, "Completes landlord_data").
    pub async fn complete_landlord_data(
        &self,
        contract_id: ContractId,
        actor: UserId,
        landlord_data: JsonMap<String, JsonValue>,
        economic_terms: JsonMap<String, JsonValue>,
        contract_terms: JsonMap<String, JsonValue>,
    ) -> Result<Contract, ContractError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        if contract.landlord_id != actor {
            return Err(ContractError::PermissionDenied(
                "only the landlord may complete landlord data".into(),
            ));
        }
        if !matches!(
            contract.current_state,
            ContractState::Draft | ContractState::LandlordCompleting
        ) {
            return Err(ContractError::InvalidTransition {
                from: contract.current_state.to_string(),
                to: ContractState::LandlordCompleting.to_string(),
            });
        }

        let from = contract.current_state;
        contract.landlord_data.extend(landlord_data);
        contract.economic_terms.extend(economic_terms);
        contract.contract_terms.extend(contract_terms);

        let to_state = if from == ContractState::Draft {
            Some(ContractState::LandlordCompleting)
        } else {
            None
        };
        if let Some(to) = to_state {
            contract.current_state = to;
        }

        Ok(self
            .commit(
                contract,
                ActionType::LandlordDataCompleted,
                "landlord data completed".into(),
                Some(from),
                to_state,
                JsonMap::new(),
                actor,
                Role::Landlord,
            )
            .await?)
    }

    /// Fills in the tenant's structured payload and transitions
    /// `TENANT_REVIEWING -> LANDLORD_REVIEWING` (spec §9, Open Question #2:
    /// this is implemented as the explicit path).
    pub async fn complete_tenant_data(
        &self,
        contract_id: ContractId,
        actor: UserId,
        tenant_data: JsonMap<String, JsonValue>,
    ) -> Result<Contract, ContractError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        if contract.tenant_id != Some(actor) {
            return Err(ContractError::PermissionDenied(
                "only the linked tenant may complete tenant data".into(),
            ));
        }
        if contract.current_state != ContractState::TenantReviewing {
            return Err(ContractError::InvalidTransition {
                from: contract.current_state.to_string(),
                to: ContractState::LandlordReviewing.to_string(),
            });
        }
        if contract.has_pending_objections {
            return Err(ContractError::Validation(
                "cannot complete tenant data while objections are pending".into(),
            ));
        }

        let from = contract.current_state;
        contract.tenant_data.extend(tenant_data);
        contract.current_state = ContractState::LandlordReviewing;

        Ok(self
            .commit(
                contract,
                ActionType::TenantDataCompleted,
                "tenant data completed".into(),
                Some(from),
                Some(ContractState::LandlordReviewing),
                JsonMap::new(),
                actor,
                Role::Tenant,
            )
            .await?)
    }

    /// Records one party's approval (spec §4.7: "set by explicit approval
    /// calls"). The landlord's approval while in `LANDLORD_REVIEWING` is also
    /// what drives the transition to `BOTH_REVIEWING`; once both flags are
    /// true the coordinator immediately advances to `READY_TO_SIGN` in the
    /// same call.
    pub async fn approve(
        &self,
        contract_id: ContractId,
        actor: UserId,
        role: Role,
    ) -> Result<Contract, ContractError> {
        let mut contract = self.services.contracts.get(contract_id).await?;
        match contract_role(&contract, actor) {
            Some(r) if r == role => {}
            _ => {
                return Err(ContractError::PermissionDenied(
                    "actor is not a party to this contract in the claimed role".into(),
                ))
            }
        }
        if !matches!(
            contract.current_state,
            ContractState::LandlordReviewing | ContractState::BothReviewing
        ) {
            return Err(ContractError::InvalidTransition {
                from: contract.current_state.to_string(),
                to: "approved".into(),
            });
        }
        if contract.has_pending_objections {
            return Err(ContractError::Validation(
                "cannot approve while objections are pending".into(),
            ));
        }

        let from = contract.current_state;
        let now = self.services.clock.now();
        let mut to_state = None;

        match role {
            Role::Landlord => {
                contract.landlord.approved = true;
                contract.landlord.approved_at = Some(now);
                if from == ContractState::LandlordReviewing {
                    to_state = Some(ContractState::BothReviewing);
                }
            }
            Role::Tenant => {
                contract.tenant.approved = true;
                contract.tenant.approved_at = Some(now);
            }
            _ => {
                return Err(ContractError::PermissionDenied(
                    "only landlord or tenant may approve".into(),
                ))
            }
        }

        if let Some(to) = to_state {
            contract.current_state = to;
        }
        contract = self
            .commit(
                contract,
                ActionType::PartyApproved,
                format!("{role} approved"),
                Some(from),
                to_state,
                JsonMap::new(),
                actor,
                role,
            )
            .await?;

        if contract.current_state == ContractState::BothReviewing
            && contract.landlord.approved
            && contract.tenant.approved
        {
            let from = contract.current_state;
            contract.current_state = ContractState::ReadyToSign;
            contract = self
                .commit(
                    contract,
                    ActionType::StateTransition,
                    "both parties approved, ready to sign".into(),
                    Some(from),
                    Some(ContractState::ReadyToSign),
                    JsonMap::new(),
                    actor,
                    Role::System,
                )
                .await?;
        }

        Ok(contract)
    }

    /// Cancels a contract from any non-terminal state (spec §4.8, every row
    /// in the table permits a `CANCELLED` edge).
    pub async fn cancel(
        &self,
        contract_id: ContractId,
        actor: UserId,
        role: Role,
        reason: String,
    ) -> Result<Contract, ContractError> {
        let contract = self.services.contracts.get(contract_id).await?;
        self.transition(
            contract,
            ContractState::Cancelled,
            actor,
            role,
            ActionType::ContractCancelled,
            reason,
        )
        .await
    }

    /// Generic, table-checked transition for cases with no bespoke business
    /// logic of their own (publication and approval have their own methods;
    /// cancellation, activation sweeps, and termination use this).
    pub async fn transition(
        &self,
        mut contract: Contract,
        to: ContractState,
        actor: UserId,
        role: Role,
        action_type: ActionType,
        description: String,
    ) -> Result<Contract, ContractError> {
        let from = contract.current_state;
        if !is_allowed(from, to, role) {
            rental_telemetry::contract_metrics().inc_transition_rejected("role_or_table");
            return Err(ContractError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        contract.current_state = to;
        Ok(self
            .commit(
                contract,
                action_type,
                description,
                Some(from),
                Some(to),
                JsonMap::new(),
                actor,
                role,
            )
            .await?)
    }

    /// `completion_percentage` (spec §4.4).
    pub fn completion_percentage(&self, contract: &Contract) -> u8 {
        contract.completion_percentage()
    }

    /// `missing_data_summary` (spec §4.4): per-party lists of missing
    /// required keys, derived from the same completion flags.
    pub fn missing_data_summary(&self, contract: &Contract) -> BTreeMap<&'static str, Vec<&'static str>> {
        let mut summary = BTreeMap::new();
        let mut landlord_missing = Vec::new();
        if contract.landlord_data.is_empty() {
            landlord_missing.push("landlord_data");
        }
        if contract.economic_terms.is_empty() {
            landlord_missing.push("economic_terms");
        }
        if contract.contract_terms.is_empty() {
            landlord_missing.push("contract_terms");
        }
        if !landlord_missing.is_empty() {
            summary.insert("landlord", landlord_missing);
        }

        let mut tenant_missing = Vec::new();
        if contract.tenant_id.is_none() {
            tenant_missing.push("tenant_linked");
        }
        if contract.tenant_data.is_empty() {
            tenant_missing.push("tenant_data");
        }
        if !contract.tenant.approved {
            tenant_missing.push("tenant_approved");
        }
        if !tenant_missing.is_empty() {
            summary.insert("tenant", tenant_missing);
        }
        summary
    }

    /// `get_current_responsible_party()` (spec §4.8).
    pub fn current_responsible_party(&self, contract: &Contract) -> Role {
        responsible_party(contract.current_state)
    }

    /// Exposes the shared collaborators to sibling workflows (C6, C7) that
    /// need to read or mutate a contract directly.
    pub fn services(&self) -> &Services {
        &self.services
    }

    pub(crate) fn history_entry(
        &self,
        contract: &Contract,
        action_type: ActionType,
        description: String,
        old_state: Option<ContractState>,
        new_state: Option<ContractState>,
        changes_made: JsonMap<String, JsonValue>,
        performed_by: UserId,
        user_role: Role,
    ) -> WorkflowHistoryEntry {
        let timestamp = self.services.clock.now();
        let integrity_hash = WorkflowHistoryEntry::compute_integrity_hash(
            contract.id,
            action_type,
            performed_by,
            timestamp,
            &description,
        );
        WorkflowHistoryEntry {
            id: HistoryEntryId::new(),
            contract_id: contract.id,
            action_type,
            description,
            performed_by,
            user_role,
            old_state,
            new_state,
            changes_made,
            metadata: HistoryMetadata::default(),
            timestamp,
            integrity_hash,
        }
    }

    /// Appends exactly one history entry and persists the contract in a
    /// single store write (spec §3 invariant (e), §4.4: "load → check →
    /// mutate → append one history entry → commit atomically").
    ///
    /// Returns the bare [`StoreError`] rather than [`ContractError`]: this is
    /// called from sibling workflows (C5, C6, C7) whose own error enum is
    /// not `ContractError`, and every component error converts from
    /// `StoreError` via `#[from]`, so `?` keeps working at every call site.
    pub(crate) async fn commit(
        &self,
        mut contract: Contract,
        action_type: ActionType,
        description: String,
        old_state: Option<ContractState>,
        new_state: Option<ContractState>,
        changes_made: JsonMap<String, JsonValue>,
        performed_by: UserId,
        user_role: Role,
    ) -> Result<Contract, rental_types::error::StoreError> {
        let entry = self.history_entry(
            &contract,
            action_type,
            description,
            old_state,
            new_state,
            changes_made,
            performed_by,
            user_role,
        );
        contract.history.push(entry);
        contract.updated_at = self.services.clock.now();
        self.services.contracts.update(contract.clone()).await?;
        if let Some(to) = new_state {
            if old_state != Some(to) {
                rental_telemetry::contract_metrics()
                    .inc_state_transition(&old_state.map(|s| s.to_string()).unwrap_or_default(), &to.to_string());
            }
        }
        rental_telemetry::contract_metrics()
            .observe_completion_percentage(contract.completion_percentage() as f64);
        Ok(contract)
    }
}

fn contract_type_label(t: ContractType) -> &'static str {
    match t {
        ContractType::RentalUrban => "rental_urban",
        ContractType::RentalCommercial => "rental_commercial",
        ContractType::RentalRoom => "rental_room",
        ContractType::RentalRural => "rental_rural",
        ContractType::Service => "service",
    }
}
