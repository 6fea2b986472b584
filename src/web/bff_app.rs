use std::sync::Arc;

use {
    axum::middleware::from_fn_with_state,
    axum_login::{
        tower_sessions::{MemoryStore, SessionManagerLayer},
        AuthManagerLayerBuilder,
    },
    tower_http::trace::TraceLayer,
    tracing::{debug, info},
};

use crate::{
    app::{middleware::bff::bff_middleware, BffRouter, Context},
    oidc::{backend::Backend, end_session::EndSession},
    web::router::Logout,
    Error,
};

pub struct BffApp {
    backend: Backend,
    session_layer: SessionManagerLayer<MemoryStore>,
    logout: Logout,
    logout_route: String,
    ctx: Arc<Context>,
}

impl BffApp {
    /// # Errors
    ///
    /// Returns an error if the principal store cannot be opened or the OIDC
    /// end-session settings are not valid URLs.
    pub async fn new(
        ctx: Arc<Context>,
        session_layer: SessionManagerLayer<MemoryStore>,
    ) -> Result<Self, Error> {
        let config = &ctx.config;

        let end_session = config
            .oidc
            .as_ref()
            .map(|oidc| EndSession::from_config(oidc, &config.website.public_origin))
            .transpose()?;
        if end_session.is_none() {
            info!("No OIDC end-session endpoint configured; logout stays local");
        }

        let logout = Logout::builder()
            .options(config.bff.clone())
            .path_base(config.routes.path_base())
            .end_session(end_session)
            .build();

        let backend = Backend::in_memory().await?;

        info!("App successfully initialized");

        Ok(Self {
            backend,
            session_layer,
            logout,
            logout_route: config.routes.with_root().logout,
            ctx,
        })
    }

    pub fn create_bff_router(self, router: Option<BffRouter>) -> BffRouter {
        debug!("Creating BFF router");

        // Auth service.
        //
        // This combines the session layer with our backend to establish the auth
        // service which will provide the auth session as a request extension.
        let auth_layer = AuthManagerLayerBuilder::new(self.backend, self.session_layer).build();

        debug!(route = %self.logout_route, "Mounting logout endpoint");

        router
            .unwrap_or_default()
            .merge(self.logout.router(&self.logout_route))
            .layer(from_fn_with_state(
                self.ctx.exemptions.clone(),
                bff_middleware,
            ))
            .layer(auth_layer)
            .layer(TraceLayer::new_for_http())
    }
}
