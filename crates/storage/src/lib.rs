// Path: crates/storage/src/lib.rs
//! In-memory reference implementations of every store port defined in
//! `rental-api`, plus fakes for the adapter ports. Doubles as the test
//! fixture for `rental-services`' integration tests (no mocking framework
//! is introduced, matching the teacher's `ioi-test-utils` convention of
//! fakes over mocks).

pub mod contract;
pub mod fakes;
pub mod guarantee;
pub mod invitation;
pub mod matching;
pub mod notification;
pub mod objection;

pub use contract::InMemoryContractStore;
pub use fakes::{InMemoryUserDirectory, PlaceholderPdfRenderer, RecordingChannelAdapter};
pub use guarantee::InMemoryGuaranteeStore;
pub use invitation::InMemoryInvitationStore;
pub use matching::InMemoryMatchStore;
pub use notification::InMemoryNotificationStore;
pub use objection::InMemoryObjectionStore;
