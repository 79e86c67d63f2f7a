//! Error taxonomy for the rental contract engine.
//!
//! Every component defines its own `thiserror` enum; each variant is
//! classified into one of the nine stable, transport-mapped kinds from the
//! specification via [`Classify`]. [`CoreError`] aggregates all component
//! errors so a single type can cross a service boundary.

use thiserror::Error;

/// One of the stable error kinds the transport layer maps to an HTTP status
/// and a machine-readable `code` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Input fails schema/range/cross-field checks.
    Validation,
    /// A referenced entity is missing.
    NotFound,
    /// The caller lacks the role or ownership required for the operation.
    PermissionDenied,
    /// The requested workflow transition is not allowed from the current state.
    InvalidStateTransition,
    /// An invitation token is malformed, unknown, expired, already accepted,
    /// or the presenting email does not match.
    InvitationInvalid,
    /// A rate-limit bucket has been exceeded.
    RateLimited,
    /// A signature was attempted before its predecessor role signed.
    OutOfOrder,
    /// A uniqueness constraint was violated.
    AlreadyExists,
    /// An external collaborator (adapter, renderer) reported a failure that
    /// must surface to the caller (as opposed to a channel delivery failure,
    /// which never does).
    ExternalFailure,
}

impl Kind {
    /// The stable, machine-readable code used in the `{ code, message, detail? }`
    /// error body (spec §7).
    pub fn code(&self) -> &'static str {
        match self {
            Kind::Validation => "validation_error",
            Kind::NotFound => "not_found",
            Kind::PermissionDenied => "permission_denied",
            Kind::InvalidStateTransition => "invalid_state_transition",
            Kind::InvitationInvalid => "invitation_invalid",
            Kind::RateLimited => "rate_limited",
            Kind::OutOfOrder => "out_of_order",
            Kind::AlreadyExists => "already_exists",
            Kind::ExternalFailure => "external_failure",
        }
    }

    /// The HTTP status an (out-of-scope) transport layer should map this to.
    pub fn http_status(&self) -> u16 {
        match self {
            Kind::Validation => 400,
            Kind::NotFound => 404,
            Kind::PermissionDenied => 403,
            Kind::InvalidStateTransition => 400,
            Kind::InvitationInvalid => 400,
            Kind::RateLimited => 429,
            Kind::OutOfOrder => 400,
            Kind::AlreadyExists => 400,
            Kind::ExternalFailure => 500,
        }
    }
}

/// Assigns a stable [`Kind`] to an error variant.
pub trait Classify {
    /// Returns the stable kind this error maps to.
    fn kind(&self) -> Kind;

    /// Convenience accessor for the transport-facing code string.
    fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Convenience accessor for the transport-facing HTTP status.
    fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

/// Failures surfaced by the store port (§6, "Persistent store port").
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the requested key.
    #[error("not found: {0}")]
    NotFound(String),
    /// A unique-constraint violation (contract_number, invitation.token_hash,
    /// active match request per tenant/property, ...).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Any other backend failure (I/O, serialization, connection loss).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl Classify for StoreError {
    fn kind(&self) -> Kind {
        match self {
            StoreError::NotFound(_) => Kind::NotFound,
            StoreError::Conflict(_) => Kind::AlreadyExists,
            StoreError::Backend(_) => Kind::ExternalFailure,
        }
    }
}

/// Errors from the contract store / workflow coordinator (C4, C8).
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("{0}")]
    Validation(String),
    #[error("contract not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for ContractError {
    fn kind(&self) -> Kind {
        match self {
            ContractError::Validation(_) => Kind::Validation,
            ContractError::NotFound(_) => Kind::NotFound,
            ContractError::PermissionDenied(_) => Kind::PermissionDenied,
            ContractError::InvalidTransition { .. } => Kind::InvalidStateTransition,
            ContractError::AlreadyExists(_) => Kind::AlreadyExists,
            ContractError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the invitation subsystem (C5).
#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("{0}")]
    Validation(String),
    #[error("invitation not found")]
    NotFound,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("malformed token")]
    MalformedToken,
    #[error("invitation expired")]
    Expired,
    #[error("invitation already accepted")]
    AlreadyAccepted,
    #[error("tenant email does not match invitation")]
    EmailMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for InvitationError {
    fn kind(&self) -> Kind {
        match self {
            InvitationError::Validation(_) => Kind::Validation,
            InvitationError::NotFound => Kind::NotFound,
            InvitationError::PermissionDenied(_) => Kind::PermissionDenied,
            InvitationError::InvalidTransition(_) => Kind::InvalidStateTransition,
            InvitationError::MalformedToken
            | InvitationError::Expired
            | InvitationError::AlreadyAccepted
            | InvitationError::EmailMismatch => Kind::InvitationInvalid,
            InvitationError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the objection engine (C6).
#[derive(Debug, Error)]
pub enum ObjectionError {
    #[error("{0}")]
    Validation(String),
    #[error("objection not found")]
    NotFound,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for ObjectionError {
    fn kind(&self) -> Kind {
        match self {
            ObjectionError::Validation(_) => Kind::Validation,
            ObjectionError::NotFound => Kind::NotFound,
            ObjectionError::PermissionDenied(_) => Kind::PermissionDenied,
            ObjectionError::InvalidTransition(_) => Kind::InvalidStateTransition,
            ObjectionError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the signature & publication flow (C7).
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("{0}")]
    Validation(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("signed out of order: {0} must sign before {1}")]
    OutOfOrder(String, String),
    #[error("authentication level {provided:?} does not satisfy required level {required:?}")]
    InsufficientAuth { provided: String, required: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for SignatureError {
    fn kind(&self) -> Kind {
        match self {
            SignatureError::Validation(_) => Kind::Validation,
            SignatureError::PermissionDenied(_) => Kind::PermissionDenied,
            SignatureError::InvalidTransition(_) => Kind::InvalidStateTransition,
            SignatureError::OutOfOrder(_, _) => Kind::OutOfOrder,
            SignatureError::InsufficientAuth { .. } => Kind::PermissionDenied,
            SignatureError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the match-request engine (C3).
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),
    #[error("match request not found")]
    NotFound,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("an active match request already exists for this tenant/property pair")]
    AlreadyExists,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for MatchError {
    fn kind(&self) -> Kind {
        match self {
            MatchError::Validation(_) => Kind::Validation,
            MatchError::NotFound => Kind::NotFound,
            MatchError::PermissionDenied(_) => Kind::PermissionDenied,
            MatchError::AlreadyExists => Kind::AlreadyExists,
            MatchError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the notification dispatcher (C2). Adapter/channel failures
/// never reach this type (they are recorded on the delivery row instead);
/// this covers only the caller-visible half of §4.2.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("{0}")]
    Validation(String),
    #[error("notification not found")]
    NotFound,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("template rendering is unavailable: {0}")]
    ExternalFailure(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for NotificationError {
    fn kind(&self) -> Kind {
        match self {
            NotificationError::Validation(_) => Kind::Validation,
            NotificationError::NotFound => Kind::NotFound,
            NotificationError::PermissionDenied(_) => Kind::PermissionDenied,
            NotificationError::ExternalFailure(_) => Kind::ExternalFailure,
            NotificationError::Store(e) => e.kind(),
        }
    }
}

/// Errors from the rate-limit & IP-policy guard (C9).
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },
    #[error("request blocked: source IP is on the blocked list")]
    Blocked,
}

impl Classify for RateLimitError {
    fn kind(&self) -> Kind {
        match self {
            RateLimitError::Exceeded { .. } => Kind::RateLimited,
            RateLimitError::Blocked => Kind::PermissionDenied,
        }
    }
}

/// The top-level error type returned across a service boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Invitation(#[from] InvitationError),
    #[error(transparent)]
    Objection(#[from] ObjectionError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Classify for CoreError {
    fn kind(&self) -> Kind {
        match self {
            CoreError::Contract(e) => e.kind(),
            CoreError::Invitation(e) => e.kind(),
            CoreError::Objection(e) => e.kind(),
            CoreError::Signature(e) => e.kind(),
            CoreError::Match(e) => e.kind(),
            CoreError::Notification(e) => e.kind(),
            CoreError::RateLimit(e) => e.kind(),
            CoreError::Store(e) => e.kind(),
        }
    }
}

/// A convenience alias for fallible operations whose error is not yet known
/// to belong to one particular component.
pub type CoreResult<T> = Result<T, CoreError>;
