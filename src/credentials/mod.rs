//! Credential handling: signed access tokens and password hashes.

pub mod password;
pub mod token;

pub use token::{Claims, TokenError, TokenService};
