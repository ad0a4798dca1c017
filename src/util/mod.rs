//! Browser-environment seams shared by the session store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns (storage, location) behind small
//! traits so the auth core stays testable natively.

pub mod navigation;
pub mod storage;
