//! Hard (full-page) navigation seam used by forced session expiry.
//!
//! Router-level redirects go through `leptos_router`; this trait only covers
//! the cases where the whole page must reload onto a login entry point.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::cell::RefCell;

/// Reads the current location and performs full-page redirects.
pub trait Navigator {
    /// Path component of the current location, e.g. `/admin/zones`.
    fn current_path(&self) -> String;

    /// Replace the whole page with `path`.
    fn hard_redirect(&self, path: &str);
}

/// In-memory [`Navigator`]: redirects are recorded and become the current path.
/// Used outside the browser.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    path: RefCell<String>,
    redirects: RefCell<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn at(path: &str) -> Self {
        Self { path: RefCell::new(path.to_owned()), redirects: RefCell::new(Vec::new()) }
    }

    pub fn set_path(&self, path: &str) {
        path.clone_into(&mut self.path.borrow_mut());
    }

    /// Every hard redirect so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.borrow().clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn hard_redirect(&self, path: &str) {
        log::debug!("hard redirect to {path}");
        self.redirects.borrow_mut().push(path.to_owned());
        self.set_path(path);
    }
}

/// [`Navigator`] over `window.location`.
#[cfg(feature = "csr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

#[cfg(feature = "csr")]
impl Navigator for BrowserNavigator {
    fn current_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default()
    }

    fn hard_redirect(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            log::warn!("hard redirect to {path} skipped: no window");
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            log::error!("hard redirect to {path} failed: {e:?}");
        }
    }
}
