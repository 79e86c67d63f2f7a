//! Core domain types shared by every crate in the rental contract engine.
//!
//! This crate holds no behavior beyond small, pure methods on the data
//! itself (completion scoring, integrity hashing, format validation); the
//! workflow logic that operates on these types lives in `rental-services`.

pub mod auth;
pub mod contract;
pub mod error;
pub mod guarantee;
pub mod history;
pub mod ids;
pub mod invitation;
pub mod matching;
pub mod notification;
pub mod objection;

pub use error::{Classify, CoreError, CoreResult, Kind};
