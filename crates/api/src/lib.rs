// Path: crates/api/src/lib.rs
//! Port traits and dependency-injection wiring for the rental contract
//! engine. This crate defines the seams; `rental-storage` and
//! `rental-services` provide (respectively) the reference store
//! implementations and the workflow logic that consumes them.

pub mod ports;
pub mod services;

pub use services::Services;
