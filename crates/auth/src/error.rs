use thiserror::Error;

/// Authentication-layer error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// Hashing/signing machinery failed (malformed stored hash, bad key).
    #[error("crypto error: {0}")]
    Crypto(String),
}
