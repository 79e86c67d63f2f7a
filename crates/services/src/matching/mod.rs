// Path: crates/services/src/matching/mod.rs
//! The tenant/property match-request engine (C3, spec §4.3).

use crate::notification::{NotificationDispatcher, NotificationRequest};
use chrono::{Duration, Utc};
use rental_api::Services;
use rental_types::error::MatchError;
use rental_types::ids::{MatchCriteriaId, MatchRequestId, PropertyId, UserId};
use rental_types::matching::{
    ContactPayload, EmploymentType, MatchCriteria, MatchPriority, MatchRequest, MatchStatus,
    PropertyListing,
};
use rental_types::notification::{ContentRef, NotificationKind, NotificationPriority};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Map as JsonMap;
use tracing::info;

/// Everything a tenant supplies when expressing interest in a property
/// (spec §4.3, `submit`).
pub struct MatchSubmission {
    pub tenant_message: String,
    pub contact: ContactPayload,
    pub stated_monthly_income: Option<Decimal>,
    pub employment_type: Option<EmploymentType>,
    pub lease_duration_months: u32,
    pub occupants: u32,
    pub has_pets: bool,
    pub is_smoker: bool,
    pub priority: MatchPriority,
    pub has_rental_references: bool,
    pub has_employment_proof: bool,
    pub has_credit_check: bool,
}

/// Cap on requests `process_daily` will auto-submit for one criteria in a
/// single run (spec §4.3, "capped at 3/day").
const AUTO_APPLY_DAILY_CAP: usize = 3;

/// Minimum `compatibility_score` for `process_daily` to auto-submit a
/// match (spec §4.3).
const AUTO_APPLY_MIN_SCORE: u32 = 70;

#[derive(Clone)]
pub struct MatchingEngine {
    services: Services,
    notifier: NotificationDispatcher,
}

impl MatchingEngine {
    pub fn new(services: Services) -> Self {
        let notifier = NotificationDispatcher::new(services.clone());
        Self { services, notifier }
    }

    /// `submit` (spec §4.3): refuses a duplicate active request for the
    /// same (tenant, property) pair.
    pub async fn submit(
        &self,
        tenant_id: UserId,
        landlord_id: UserId,
        property_id: PropertyId,
        submission: MatchSubmission,
    ) -> Result<MatchRequest, MatchError> {
        if self.services.matches.has_active_request(tenant_id, property_id).await? {
            rental_telemetry::matching_metrics().inc_duplicate_rejected();
            return Err(MatchError::AlreadyExists);
        }

        let now = self.services.clock.now();
        let request = MatchRequest {
            id: MatchRequestId::new(),
            tenant_id,
            landlord_id,
            property_id,
            tenant_message: submission.tenant_message,
            contact: submission.contact,
            stated_monthly_income: submission.stated_monthly_income,
            employment_type: submission.employment_type,
            lease_duration_months: submission.lease_duration_months,
            occupants: submission.occupants,
            has_pets: submission.has_pets,
            is_smoker: submission.is_smoker,
            priority: submission.priority,
            status: MatchStatus::Pending,
            expires_at: now + Duration::days(MatchRequest::DEFAULT_TTL_DAYS),
            follow_up_count: 0,
            last_follow_up: None,
            landlord_response: None,
            auto_submitted: false,
            created_at: now,
            updated_at: now,
        };
        self.services.matches.insert_request(request.clone()).await?;

        rental_telemetry::matching_metrics().inc_match_requests_submitted();
        self.notify(
            landlord_id,
            NotificationKind::MatchRequestReceived,
            "New match request",
            "A tenant has expressed interest in one of your properties.",
            NotificationPriority::Normal,
            request.id,
        )
        .await;

        info!(match_request_id = %request.id, "match request submitted");
        Ok(request)
    }

    pub async fn mark_viewed(&self, request_id: MatchRequestId, landlord_id: UserId) -> Result<MatchRequest, MatchError> {
        let mut request = self.services.matches.get_request(request_id).await?;
        if request.landlord_id != landlord_id {
            return Err(MatchError::PermissionDenied("not the landlord for this request".into()));
        }
        if request.status == MatchStatus::Pending {
            request.status = MatchStatus::Viewed;
            request.updated_at = self.services.clock.now();
            self.services.matches.update_request(request.clone()).await?;
        }
        Ok(request)
    }

    /// `accept` (spec §4.3): transitions the request; the resulting
    /// `accepted` event is left for the contract engine to consume, which
    /// this crate does not force (out-of-scope per spec).
    pub async fn accept(
        &self,
        request_id: MatchRequestId,
        landlord_id: UserId,
        response: Option<String>,
    ) -> Result<MatchRequest, MatchError> {
        let mut request = self.services.matches.get_request(request_id).await?;
        if request.landlord_id != landlord_id {
            return Err(MatchError::PermissionDenied("not the landlord for this request".into()));
        }
        if !request.status.is_active() {
            return Err(MatchError::Validation("match request is no longer active".into()));
        }
        request.status = MatchStatus::Accepted;
        request.landlord_response = response;
        request.updated_at = self.services.clock.now();
        self.services.matches.update_request(request.clone()).await?;

        self.notify(
            request.tenant_id,
            NotificationKind::MatchRequestAccepted,
            "Match request accepted",
            "The landlord has accepted your match request.",
            NotificationPriority::High,
            request.id,
        )
        .await;

        info!(match_request_id = %request.id, "match request accepted");
        Ok(request)
    }

    pub async fn reject(
        &self,
        request_id: MatchRequestId,
        landlord_id: UserId,
        response: Option<String>,
    ) -> Result<MatchRequest, MatchError> {
        let mut request = self.services.matches.get_request(request_id).await?;
        if request.landlord_id != landlord_id {
            return Err(MatchError::PermissionDenied("not the landlord for this request".into()));
        }
        if !request.status.is_active() {
            return Err(MatchError::Validation("match request is no longer active".into()));
        }
        request.status = MatchStatus::Rejected;
        request.landlord_response = response;
        request.updated_at = self.services.clock.now();
        self.services.matches.update_request(request.clone()).await?;
        Ok(request)
    }

    pub async fn cancel(&self, request_id: MatchRequestId, tenant_id: UserId) -> Result<MatchRequest, MatchError> {
        let mut request = self.services.matches.get_request(request_id).await?;
        if request.tenant_id != tenant_id {
            return Err(MatchError::PermissionDenied("not the tenant for this request".into()));
        }
        if !request.status.is_active() {
            return Err(MatchError::Validation("match request is no longer active".into()));
        }
        request.status = MatchStatus::Cancelled;
        request.updated_at = self.services.clock.now();
        self.services.matches.update_request(request.clone()).await?;
        Ok(request)
    }

    /// `compatibility_score` (spec §4.3): deterministic, additive, clamped
    /// to `[0, 100]`.
    pub fn compatibility_score(request: &MatchRequest, property: &PropertyListing, submission: &ScoreInputs) -> u32 {
        let mut score = 0u32;

        if let Some(income) = request.stated_monthly_income {
            if !property.monthly_rent.is_zero() {
                let ratio = (income / property.monthly_rent).to_f64().unwrap_or(0.0);
                score += if ratio >= 4.0 {
                    30
                } else if ratio >= 3.0 {
                    25
                } else if ratio >= 2.5 {
                    15
                } else if ratio >= 2.0 {
                    10
                } else {
                    5
                };
            }
        }

        if submission.has_rental_references {
            score += 10;
        }
        if submission.has_employment_proof {
            score += 10;
        }
        if submission.has_credit_check {
            score += 5;
        }

        score += if request.has_pets {
            if property.pets_allowed {
                15
            } else {
                0
            }
        } else {
            10
        };

        score += if request.is_smoker == property.smoking_allowed {
            if request.is_smoker {
                10
            } else {
                5
            }
        } else if !request.is_smoker {
            5
        } else {
            0
        };

        if (6..=24).contains(&request.lease_duration_months) {
            score += 10;
        } else if request.lease_duration_months >= 12 {
            score += 5;
        }

        let message_len = request.tenant_message.chars().count();
        if message_len >= 200 {
            score += 10;
        } else if message_len >= 100 {
            score += 5;
        }

        score.min(100)
    }

    /// `criteria.find_matching` (spec §4.3): available properties filtered
    /// by the tenant's saved criteria.
    pub async fn find_matching(&self, criteria: &MatchCriteria) -> Result<Vec<PropertyListing>, MatchError> {
        let properties = self.services.matches.list_available_properties().await?;
        Ok(properties
            .into_iter()
            .filter(|p| p.is_available)
            .filter(|p| criteria.min_price.map_or(true, |min| p.monthly_rent >= min))
            .filter(|p| criteria.max_price.map_or(true, |max| p.monthly_rent <= max))
            .filter(|p| criteria.preferred_cities.is_empty() || criteria.preferred_cities.contains(&p.city))
            .filter(|p| criteria.property_types.is_empty() || criteria.property_types.contains(&p.property_type))
            .filter(|p| criteria.min_bedrooms.map_or(true, |min| p.bedrooms >= min))
            .filter(|p| criteria.min_bathrooms.map_or(true, |min| p.bathrooms >= min))
            .filter(|p| criteria.min_area_sqm.map_or(true, |min| p.area_sqm >= min))
            .filter(|p| {
                criteria
                    .required_amenities
                    .iter()
                    .all(|amenity| p.amenities.contains(amenity))
            })
            .filter(|p| !criteria.requires_pets_allowed || p.pets_allowed)
            .filter(|p| !criteria.requires_furnished || p.furnished)
            .filter(|p| !criteria.requires_parking || p.parking_available)
            .filter(|p| !criteria.requires_smoking_allowed || p.smoking_allowed)
            .collect())
    }

    /// `process_daily` (spec §4.3): for every auto-apply criteria, finds the
    /// best-matching properties and auto-submits requests scoring at least
    /// [`AUTO_APPLY_MIN_SCORE`], capped at [`AUTO_APPLY_DAILY_CAP`] per
    /// tenant per run, then sends one digest notification.
    pub async fn process_daily(&self) -> Result<u64, MatchError> {
        let mut submitted = 0u64;
        for criteria in self.services.matches.list_auto_apply_criteria().await? {
            let properties = self.find_matching(&criteria).await?;
            let mut applied_this_run = 0usize;
            let mut last_submitted_id = None;
            for property in properties {
                if applied_this_run >= AUTO_APPLY_DAILY_CAP {
                    break;
                }
                if self
                    .services
                    .matches
                    .has_active_request(criteria.tenant_id, property.id)
                    .await?
                {
                    continue;
                }
                let request = MatchRequest {
                    id: MatchRequestId::new(),
                    tenant_id: criteria.tenant_id,
                    landlord_id: property.landlord_id,
                    property_id: property.id,
                    tenant_message: "Automatically submitted based on your saved search criteria.".into(),
                    contact: ContactPayload {
                        email: String::new(),
                        phone: None,
                        preferred_contact_method: None,
                    },
                    stated_monthly_income: None,
                    employment_type: None,
                    lease_duration_months: 12,
                    occupants: 1,
                    has_pets: criteria.requires_pets_allowed,
                    is_smoker: false,
                    priority: MatchPriority::Normal,
                    status: MatchStatus::Pending,
                    expires_at: self.services.clock.now() + Duration::days(MatchRequest::DEFAULT_TTL_DAYS),
                    follow_up_count: 0,
                    last_follow_up: None,
                    landlord_response: None,
                    auto_submitted: true,
                    created_at: self.services.clock.now(),
                    updated_at: self.services.clock.now(),
                };
                let score = Self::compatibility_score(
                    &request,
                    &property,
                    &ScoreInputs {
                        has_rental_references: false,
                        has_employment_proof: false,
                        has_credit_check: false,
                    },
                );
                if score < AUTO_APPLY_MIN_SCORE {
                    continue;
                }
                last_submitted_id = Some(request.id);
                self.services.matches.insert_request(request.clone()).await?;
                rental_telemetry::matching_metrics().inc_match_requests_submitted();
                rental_telemetry::matching_metrics().observe_compatibility_score(score as f64);
                applied_this_run += 1;
                submitted += 1;
            }
            if let Some(request_id) = last_submitted_id {
                self.notify(
                    criteria.tenant_id,
                    NotificationKind::MatchRequestReceived,
                    "New automatic matches",
                    &format!("{applied_this_run} new match request(s) were submitted on your behalf."),
                    NotificationPriority::Low,
                    request_id,
                )
                .await;
            }
        }
        Ok(submitted)
    }

    /// `expire_old` (spec §4.3): ages out stale pending/viewed requests.
    pub async fn expire_old(&self) -> Result<u64, MatchError> {
        let now = self.services.clock.now();
        let mut count = 0;
        for request in self.services.matches.list_active_expiring_before(now).await? {
            if matches!(request.status, MatchStatus::Pending | MatchStatus::Viewed) {
                let tenant_id = request.tenant_id;
                let id = request.id;
                let mut request = request;
                request.status = MatchStatus::Expired;
                request.updated_at = now;
                self.services.matches.update_request(request).await?;
                self.notify(
                    tenant_id,
                    NotificationKind::MatchFollowUpReminder,
                    "Match request expired",
                    "Your match request has expired without a response.",
                    NotificationPriority::Low,
                    id,
                )
                .await;
                count += 1;
            }
        }
        if count > 0 {
            rental_telemetry::matching_metrics().inc_expired(count);
        }
        Ok(count)
    }

    /// `send_follow_up_reminders` (spec §4.3): nudges landlords on requests
    /// stalled for at least 2 days, at most twice.
    pub async fn send_follow_up_reminders(&self) -> Result<u64, MatchError> {
        let now = self.services.clock.now();
        let age_threshold = now - Duration::days(2);
        let mut count = 0;
        for landlord_id in landlord_ids_with_requests(&self.services).await? {
            for mut request in self.services.matches.list_requests_for_landlord(landlord_id).await? {
                if !matches!(request.status, MatchStatus::Pending | MatchStatus::Viewed) {
                    continue;
                }
                if request.created_at > age_threshold || request.follow_up_count >= 2 {
                    continue;
                }
                let due = match request.last_follow_up {
                    None => true,
                    Some(last) => last <= age_threshold,
                };
                if !due {
                    continue;
                }
                request.follow_up_count += 1;
                request.last_follow_up = Some(now);
                request.updated_at = now;
                self.services.matches.update_request(request.clone()).await?;
                self.notify(
                    landlord_id,
                    NotificationKind::MatchFollowUpReminder,
                    "Pending match request reminder",
                    "You have a match request awaiting your response.",
                    NotificationPriority::Normal,
                    request.id,
                )
                .await;
                rental_telemetry::matching_metrics().inc_follow_up_sent();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn notify(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        title: &str,
        body: &str,
        priority: NotificationPriority,
        request_id: MatchRequestId,
    ) {
        let request = NotificationRequest {
            recipient,
            kind,
            title: title.to_string(),
            template: body.to_string(),
            context: JsonMap::new(),
            priority,
            content_ref: ContentRef::MatchRequest { id: request_id },
            channels: None,
            scheduled_at: None,
        };
        if let Err(err) = self.notifier.create_notification(request).await {
            tracing::warn!(error = %err, "failed to create match notification");
        }
    }
}

/// Inputs to [`MatchingEngine::compatibility_score`] not carried on
/// [`MatchRequest`] itself (spec §4.3, "documentation bundle").
pub struct ScoreInputs {
    pub has_rental_references: bool,
    pub has_employment_proof: bool,
    pub has_credit_check: bool,
}

/// Distinct landlords with at least one match request, derived from the
/// tenant-scoped listing port since the store exposes no direct "all
/// landlords" query.
async fn landlord_ids_with_requests(services: &Services) -> Result<Vec<UserId>, MatchError> {
    let mut ids: Vec<UserId> = Vec::new();
    for property in services.matches.list_available_properties().await? {
        if !ids.contains(&property.landlord_id) {
            ids.push(property.landlord_id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_types::ids::{PropertyId as Pid, UserId as Uid};

    fn property(rent: Decimal) -> PropertyListing {
        PropertyListing {
            id: Pid::new(),
            landlord_id: Uid::new(),
            city: "Lisbon".into(),
            property_type: "apartment".into(),
            monthly_rent: rent,
            bedrooms: 2,
            bathrooms: 1,
            area_sqm: Decimal::new(60, 0),
            amenities: vec![],
            pets_allowed: true,
            furnished: true,
            parking_available: false,
            smoking_allowed: false,
            is_available: true,
        }
    }

    fn request(income: Decimal, message_len: usize) -> MatchRequest {
        MatchRequest {
            id: MatchRequestId::new(),
            tenant_id: Uid::new(),
            landlord_id: Uid::new(),
            property_id: Pid::new(),
            tenant_message: "x".repeat(message_len),
            contact: ContactPayload { email: "a@b.com".into(), phone: None, preferred_contact_method: None },
            stated_monthly_income: Some(income),
            employment_type: None,
            lease_duration_months: 12,
            occupants: 1,
            has_pets: true,
            is_smoker: false,
            priority: MatchPriority::Normal,
            status: MatchStatus::Pending,
            expires_at: Utc::now(),
            follow_up_count: 0,
            last_follow_up: None,
            landlord_response: None,
            auto_submitted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn score_is_clamped_and_monotonic_in_documentation() {
        let property = property(Decimal::new(1000, 0));
        let req = request(Decimal::new(5000, 0), 250);
        let base = MatchingEngine::compatibility_score(
            &req,
            &property,
            &ScoreInputs { has_rental_references: false, has_employment_proof: false, has_credit_check: false },
        );
        let with_docs = MatchingEngine::compatibility_score(
            &req,
            &property,
            &ScoreInputs { has_rental_references: true, has_employment_proof: true, has_credit_check: true },
        );
        assert!(with_docs >= base);
        assert!(with_docs <= 100);
    }
}
