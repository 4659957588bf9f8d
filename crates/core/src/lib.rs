//! Shared building blocks for studio-auth.
//!
//! This crate has no database dependency so both the store layer and the
//! request layer (and any future CLI tooling) can use it.

pub mod config;
pub mod credential;
pub mod error;
pub mod session_token;
pub mod types;
