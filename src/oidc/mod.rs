use serde::Deserialize;

pub mod backend;
pub mod end_session;

/// Query parameter carrying the session id a logout request is bound to.
pub const SESSION_ID_PARAM: &str = "sid";

/// Query parameter carrying the post-logout destination.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// The claims an upstream login hands to the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub subject: String,
    pub name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}
