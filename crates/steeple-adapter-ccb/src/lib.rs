//! # Church Community Builder adapter
//!
//! Integrates the canonical store with the CCB API. Read-heavy: list,
//! get, and update for individuals; the credential layer owns token
//! acquisition.

pub mod adapter;
pub mod client;

pub use adapter::{ccb_manifest, CcbAdapter};
pub use client::CcbClient;
