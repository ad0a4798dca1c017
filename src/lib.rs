//! # hyfreedom-portal
//!
//! Leptos + WASM frontend core for the HyFreeDom domain portal. The portal has
//! a user side (`/user/...`) and an admin side (`/admin/...`), each with its
//! own independently persisted session.
//!
//! This crate contains the session store and its persistence, the navigation
//! guard, the token-expiry escalator, the auth API client, and the app shell
//! that wires them into the router. Browser bindings are behind the `csr`
//! feature; without it the crate builds natively with in-memory storage and
//! navigation so the auth core can be tested with `cargo test`.

pub mod app;
pub mod config;
pub mod error;
pub mod net;
pub mod routes;
pub mod state;
pub mod util;

/// WASM entry point: install the panic hook and logger, then mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    let level = if config::PortalConfig::load().environment.is_dev() {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    console_log::init_with_level(level).ok();

    leptos::mount::mount_to_body(app::App);
}
