//! Flutter-facing bindings for the CRM core.

pub mod api;
