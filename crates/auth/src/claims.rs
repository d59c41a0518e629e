use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the API expects once a token has been
/// decoded and verified. `iat`/`exp` are Unix timestamps so the standard
/// expiry validation applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject — the actor identity threaded into every store operation.
    pub sub: UserId,

    /// Username, echoed back by `/whoami` and used for display only.
    pub name: String,

    /// Issued-at (Unix timestamp).
    pub iat: i64,

    /// Expiration (Unix timestamp).
    pub exp: i64,
}
