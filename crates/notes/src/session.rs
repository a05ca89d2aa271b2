use crate::note::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session is still loading")]
    Loading,
    #[error("no user is signed in")]
    SignedOut,
}

/// Source of the signed-in identity.
pub trait SessionProvider {
    fn current_user(&self) -> Option<User>;
    fn is_loading(&self) -> bool;

    fn require_user(&self) -> Result<User, SessionError> {
        if self.is_loading() {
            return Err(SessionError::Loading);
        }
        self.current_user().ok_or(SessionError::SignedOut)
    }
}

/// Fixed session state.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user: Option<User>,
    loading: bool,
}

impl StaticSession {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn is_loading(&self) -> bool {
        self.loading
    }
}
