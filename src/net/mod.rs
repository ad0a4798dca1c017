//! Networking modules for the backend auth API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the HTTP calls, `types` defines the wire schema, and `codes`
//! maps backend business codes to default messages.

pub mod api;
pub mod codes;
pub mod types;
