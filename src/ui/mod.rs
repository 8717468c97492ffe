//! UI components module
//!
//! Reusable widgets and dialogs shared across views.

pub mod components;
pub mod confirm;
pub mod pagination;
