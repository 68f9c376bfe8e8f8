//! OAuth2 primitives and collaborator contracts for the token gate.

pub mod client_auth;
pub mod config;
pub mod context;
pub mod crypto;
pub mod grant_type;
pub mod memory;
pub mod oauth_provider;
pub mod types;
