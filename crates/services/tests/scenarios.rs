// Path: crates/services/tests/scenarios.rs
//! End-to-end scenarios against the in-memory reference stores (spec §8).

use rental_api::ports::SystemClock;
use rental_api::Services;
use rental_services::{
    ContractWorkflow, InvitationSubsystem, MatchingEngine, NotificationDispatcher, ObjectionEngine,
    SignatureFlow,
};
use rental_storage::{
    InMemoryContractStore, InMemoryGuaranteeStore, InMemoryInvitationStore, InMemoryMatchStore,
    InMemoryNotificationStore, InMemoryObjectionStore, InMemoryUserDirectory,
    PlaceholderPdfRenderer, RecordingChannelAdapter,
};
use rental_types::auth::AuthMethod;
use rental_types::contract::{ContractState, ContractType, Role};
use rental_types::error::{InvitationError, MatchError, SignatureError};
use rental_types::ids::{PropertyId, UserId};
use rental_types::invitation::InvitationMethod;
use rental_types::matching::{ContactPayload, MatchPriority};
use rental_types::notification::{DigestFrequency, NotificationChannel, NotificationPreference};
use rental_types::objection::{ObjectionPriority, ObjectionResponse};
use rental_services::matching::MatchSubmission;
use rental_services::signature::SigningAttempt;
use serde_json::json;
use std::sync::Arc;

fn services() -> Services {
    Services::new(
        Arc::new(SystemClock),
        Arc::new(InMemoryContractStore::new()),
        Arc::new(InMemoryInvitationStore::new()),
        Arc::new(InMemoryObjectionStore::new()),
        Arc::new(InMemoryGuaranteeStore::new()),
        Arc::new(InMemoryMatchStore::new()),
        Arc::new(InMemoryNotificationStore::new()),
        Arc::new(RecordingChannelAdapter::new()),
        Arc::new(PlaceholderPdfRenderer),
        Arc::new(InMemoryUserDirectory::new()),
    )
}

fn signing_attempt(methods: Vec<AuthMethod>) -> SigningAttempt {
    SigningAttempt {
        methods,
        user_agent: "integration-test".into(),
        ip_address: "127.0.0.1".into(),
        biometric_payload: None,
        device_fingerprint: None,
    }
}

/// Scenario 1 (spec §8): happy path with no guarantor, from draft through
/// publication.
#[tokio::test]
async fn happy_path_without_guarantor_reaches_published() {
    let services = services();
    let workflow = ContractWorkflow::new(services.clone());
    let invitations = InvitationSubsystem::new(services.clone(), workflow.clone());
    let signatures = SignatureFlow::new(services.clone(), workflow.clone());

    let landlord = UserId::new();
    let contract = workflow
        .create_draft(landlord, ContractType::RentalUrban, PropertyId::new())
        .await
        .unwrap();
    assert_eq!(contract.current_state, ContractState::Draft);

    let contract = workflow
        .complete_landlord_data(
            contract.id,
            landlord,
            [("bedrooms".to_string(), json!(2))].into_iter().collect(),
            [("monthly_rent".to_string(), json!("1200"))].into_iter().collect(),
            [("lease_duration_months".to_string(), json!(12))].into_iter().collect(),
        )
        .await
        .unwrap();
    assert_eq!(contract.current_state, ContractState::LandlordCompleting);

    let (_invitation, token) = invitations
        .create(
            contract.id,
            landlord,
            "tenant@example.com".into(),
            None,
            "Tenant Example".into(),
            InvitationMethod::Email,
            None,
            7,
        )
        .await
        .unwrap();

    let tenant = UserId::new();
    invitations.accept(&token, tenant, "tenant@example.com").await.unwrap();

    let contract = workflow
        .complete_tenant_data(contract.id, tenant, [("occupants".to_string(), json!(1))].into_iter().collect())
        .await
        .unwrap();
    assert_eq!(contract.current_state, ContractState::LandlordReviewing);

    workflow.approve(contract.id, landlord, Role::Landlord).await.unwrap();
    let contract = workflow.approve(contract.id, tenant, Role::Tenant).await.unwrap();
    assert_eq!(contract.current_state, ContractState::ReadyToSign);

    let contract = signatures
        .sign(contract.id, tenant, signing_attempt(vec![AuthMethod::Password]))
        .await
        .unwrap();
    assert_eq!(contract.current_state, ContractState::ReadyToSign);

    let contract = signatures
        .sign(contract.id, landlord, signing_attempt(vec![AuthMethod::Password]))
        .await
        .unwrap();
    assert_eq!(contract.current_state, ContractState::FullySigned);

    let contract = signatures.publish(contract.id, landlord).await.unwrap();
    assert_eq!(contract.current_state, ContractState::Published);
    assert!(contract.published);
    assert!(contract.start_date.is_some());
    assert!(contract.end_date.is_some());
}

/// Scenario 2 (spec §8): an accepted objection mutates the live contract
/// data, not just the objection record.
#[tokio::test]
async fn accepted_objection_mutates_contract_data() {
    let services = services();
    let workflow = ContractWorkflow::new(services.clone());
    let objections = ObjectionEngine::new(services.clone(), workflow.clone());

    let landlord = UserId::new();
    let tenant = UserId::new();
    let mut contract = workflow
        .create_draft(landlord, ContractType::RentalUrban, PropertyId::new())
        .await
        .unwrap();
    contract.tenant_id = Some(tenant);
    contract.current_state = ContractState::TenantReviewing;
    contract.economic_terms.insert("monthly_rent".into(), json!("1200"));
    services.contracts.update(contract.clone()).await.unwrap();

    let objection = objections
        .submit(
            contract.id,
            tenant,
            "economic_terms.monthly_rent".into(),
            json!("1200"),
            json!("1100"),
            "The advertised price was different from what was quoted to me.".into(),
            ObjectionPriority::Medium,
        )
        .await
        .unwrap();

    let resolved = objections
        .respond(objection.id, landlord, ObjectionResponse::Accepted, None)
        .await
        .unwrap();
    assert!(!resolved.requires_manual_amendment);

    let contract = services.contracts.get(contract.id).await.unwrap();
    assert_eq!(
        contract.economic_terms.get("monthly_rent"),
        Some(&json!("1100"))
    );
}

/// Scenario 3 (spec §8): signing out of turn is rejected.
#[tokio::test]
async fn out_of_order_signing_is_rejected() {
    let services = services();
    let workflow = ContractWorkflow::new(services.clone());
    let signatures = SignatureFlow::new(services.clone(), workflow.clone());

    let landlord = UserId::new();
    let tenant = UserId::new();
    let mut contract = workflow
        .create_draft(landlord, ContractType::RentalUrban, PropertyId::new())
        .await
        .unwrap();
    contract.tenant_id = Some(tenant);
    contract.current_state = ContractState::ReadyToSign;
    services.contracts.update(contract.clone()).await.unwrap();

    let err = signatures
        .sign(contract.id, landlord, signing_attempt(vec![AuthMethod::Password]))
        .await
        .unwrap_err();
    assert!(matches!(err, SignatureError::OutOfOrder(..)));
}

/// Scenario 4 (spec §8): replaying an already-accepted invitation fails.
#[tokio::test]
async fn invitation_replay_after_acceptance_is_rejected() {
    let services = services();
    let workflow = ContractWorkflow::new(services.clone());
    let invitations = InvitationSubsystem::new(services.clone(), workflow.clone());

    let landlord = UserId::new();
    let contract = workflow
        .create_draft(landlord, ContractType::RentalUrban, PropertyId::new())
        .await
        .unwrap();
    let (_invitation, token) = invitations
        .create(
            contract.id,
            landlord,
            "tenant@example.com".into(),
            None,
            "Tenant Example".into(),
            InvitationMethod::Email,
            None,
            7,
        )
        .await
        .unwrap();

    let tenant = UserId::new();
    invitations.accept(&token, tenant, "tenant@example.com").await.unwrap();

    let err = invitations
        .accept(&token, UserId::new(), "tenant@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::AlreadyAccepted));
}

/// Scenario 5 (spec §8): a duplicate active match request is rejected;
/// after cancelling the first, a new submission succeeds.
#[tokio::test]
async fn duplicate_active_match_request_is_rejected() {
    let services = services();
    let matching = MatchingEngine::new(services.clone());

    let tenant = UserId::new();
    let landlord = UserId::new();
    let property = PropertyId::new();

    let submission = || MatchSubmission {
        tenant_message: "Interested in this property.".into(),
        contact: ContactPayload { email: "tenant@example.com".into(), phone: None, preferred_contact_method: None },
        stated_monthly_income: None,
        employment_type: None,
        lease_duration_months: 12,
        occupants: 1,
        has_pets: false,
        is_smoker: false,
        priority: MatchPriority::Normal,
        has_rental_references: false,
        has_employment_proof: false,
        has_credit_check: false,
    };

    let first = matching.submit(tenant, landlord, property, submission()).await.unwrap();

    let err = matching
        .submit(tenant, landlord, property, submission())
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::AlreadyExists));

    matching.cancel(first.id, tenant).await.unwrap();
    matching.submit(tenant, landlord, property, submission()).await.unwrap();
}

/// Scenario 6 (spec §8): a channel disabled by preference is not delivered,
/// but the notification and its allowed-channel delivery are still created.
#[tokio::test]
async fn disabled_channel_blocks_delivery_not_creation() {
    let services = services();
    let recipient = UserId::new();
    services
        .notifications
        .upsert_preference(NotificationPreference {
            user_id: recipient,
            enabled_channels: vec![NotificationChannel::InApp],
            muted_kinds: vec![],
            digest_frequency: DigestFrequency::Daily,
            quiet_hours_start: None,
            quiet_hours_end: None,
        })
        .await
        .unwrap();

    let dispatcher = NotificationDispatcher::new(services.clone());
    let request = rental_services::notification::NotificationRequest {
        recipient,
        kind: rental_types::notification::NotificationKind::SystemAlert,
        title: "Heads up".into(),
        template: "System maintenance scheduled.".into(),
        context: serde_json::Map::new(),
        priority: rental_types::notification::NotificationPriority::Normal,
        content_ref: rental_types::notification::ContentRef::None,
        channels: Some(vec![NotificationChannel::Email, NotificationChannel::InApp]),
        scheduled_at: None,
    };

    let notification = dispatcher.create_notification(request).await.unwrap().unwrap();
    let deliveries = services
        .notifications
        .list_deliveries_for_notification(notification.id)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].channel, NotificationChannel::InApp);
}
