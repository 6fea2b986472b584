use {
    axum_login::tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer},
    time::Duration,
    tracing::debug,
};

use crate::util::{SameSiteConfig, SessionConfig};

pub fn create_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    debug!("Creating session layer");

    let same_site = match config.same_site_policy {
        SameSiteConfig::Strict => SameSite::Strict,
        SameSiteConfig::Lax => SameSite::Lax,
        SameSiteConfig::None => SameSite::None,
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.secure)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.inactivity_days)));

    debug!(?same_site, secure = config.secure, "Session layer created");
    session_layer
}
