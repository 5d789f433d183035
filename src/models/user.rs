use serde::{Deserialize, Serialize};

/// Identity of the caller as reported by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Outcome of resolving a request's session. Having no session is an
/// ordinary result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    Authenticated(SessionUser),
    #[default]
    Anonymous,
}

impl Session {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Session::Authenticated(u) => Some(u),
            Session::Anonymous => None,
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }
}

impl From<SessionUser> for Session {
    fn from(u: SessionUser) -> Self {
        Session::Authenticated(u)
    }
}
