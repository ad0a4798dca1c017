//! Session state for the user and admin portals.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` holds the plain data model; `store` owns it at runtime and wraps
//! every mutation with persistence.

pub mod auth;
pub mod store;
