//! `stockroom-auth` — authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! issuance/validation and password hashing only. The API layer decides how
//! tokens travel; the store layer decides where users live.

pub mod claims;
pub mod error;
pub mod password;
pub mod token;
pub mod user;

pub use claims::JwtClaims;
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{Hs256JwtSigner, Hs256JwtValidator, JwtValidator};
pub use user::{Credentials, User};
