//! Row structs and DTOs for the auth tables.

pub mod session;
pub mod user;
