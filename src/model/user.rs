use {
    axum_login::AuthUser,
    derivative::Derivative,
    serde::{Deserialize, Serialize},
    sqlx::FromRow,
};

use super::Identifiable;

/// A principal established by an upstream login. One row per login session.
#[derive(Derivative, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, FromRow)]
#[derivative(Debug)]
pub struct User {
    pub id: i64,
    /// The IdP's `sub` claim.
    pub subject: String,
    pub name: String,
    /// The IdP's `sid` claim, if the IdP issues one.
    pub session_id: Option<String>,
    #[derivative(Debug = "ignore")]
    pub id_token: Option<String>,
}

impl User {
    /// The `sid` claim, ignoring blank values.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .filter(|sid| !sid.trim().is_empty())
    }
}

impl AuthUser for User {
    type Id = i64;

    fn session_auth_hash(&self) -> &[u8] {
        self.subject.as_bytes()
    }

    fn id(&self) -> Self::Id {
        Identifiable::id(self)
    }
}

impl Identifiable<i64> for User {
    fn id(&self) -> i64 {
        self.id
    }
}
