//! `racha-auth`: authentication boundary.
//!
//! No HTTP, no storage: this crate turns a bearer token
//! into a verified caller identity and nothing more. What a caller may do inside an
//! event is decided by the settlement ledger.

pub mod claims;
pub mod jwt;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
