use stockroom_core::UserId;

/// Authenticated actor for a request.
///
/// Inserted by the auth middleware and required by every protected route;
/// the user id is threaded into store operations explicitly, never read
/// from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    user_id: UserId,
    username: String,
}

impl ActorContext {
    pub fn new(user_id: UserId, username: String) -> Self {
        Self { user_id, username }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
