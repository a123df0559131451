//! Derived read-side views over the entity collections.
//!
//! # Responsibility
//! - Compute dashboard metrics, pipeline boards, sales reports and agenda
//!   lists from collection snapshots.
//! - Stay storage-agnostic: every function takes plain slices and a date.
//!
//! # Invariants
//! - Functions here never mutate their inputs and hold no state.

pub mod agenda;
pub mod metrics;
pub mod pipeline;
pub mod report;
