//! Client-side authentication orchestration for Promptdeck.
//!
//! Drives credential submission, captcha acquisition with bounded automatic
//! retry, the email-verification handshake, and the cross-tab completion
//! broadcast that keeps sibling tabs of the same session consistent.

pub mod auth;
pub mod cli;
pub mod session;
pub mod signal;
pub mod store;
