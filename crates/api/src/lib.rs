//! studio-auth API server library.
//!
//! Exposes the session service, the request-layer building blocks (config,
//! state, error handling, extractor, routes) and background jobs so
//! integration tests and the binary entrypoint can both access them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
