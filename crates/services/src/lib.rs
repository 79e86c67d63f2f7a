// Path: crates/services/src/lib.rs
//! Business workflows for the rental contract engine. Each submodule owns
//! one component from the specification and depends only on the port traits
//! in `rental-api`, never on a concrete store or transport.

pub mod common;
pub mod contract;
pub mod invitation;
pub mod matching;
pub mod notification;
pub mod objection;
pub mod rate_guard;
pub mod signature;

pub use contract::ContractWorkflow;
pub use invitation::InvitationSubsystem;
pub use matching::MatchingEngine;
pub use notification::NotificationDispatcher;
pub use objection::ObjectionEngine;
pub use rate_guard::RateGuard;
pub use signature::SignatureFlow;
