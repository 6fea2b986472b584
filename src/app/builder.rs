use std::sync::Arc;

use tracing::debug;

use crate::{
    web::{AntiforgeryExemptions, AntiforgeryExemptionsBuilder, BffApp},
    Config, Error,
};

use super::{middleware::session::create_session_layer, BffRouter, Context, Server};

type RouterFactory = dyn FnOnce(&Arc<Context>) -> BffRouter + Send + 'static;

pub struct Builder {
    config: Config,
    router_factory: Option<Box<RouterFactory>>,
    exemptions: AntiforgeryExemptionsBuilder,
}

impl Builder {
    /// # Errors
    ///
    /// This function will return an error if the config is invalid.
    pub fn new(config: Config) -> Result<Self, Error> {
        debug!("Initializing Builder with config: {:?}", config);

        if config.routes.logout.trim_matches('/').is_empty() {
            return Err(Error::ConfigError(
                "routes.logout must name a path segment".to_string(),
            ));
        }

        Ok(Self {
            config,
            router_factory: None,
            exemptions: AntiforgeryExemptions::builder(),
        })
    }

    /// Routes of the host application, served behind the same session and BFF middleware.
    #[must_use]
    pub fn with_router<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&Arc<Context>) -> BffRouter + Send + 'static,
    {
        self.router_factory = Some(Box::new(factory));
        self
    }

    /// Declares that the route registered under `route` skips the antiforgery header check.
    #[must_use]
    pub fn skip_antiforgery_endpoint(mut self, route: impl Into<String>) -> Self {
        self.exemptions = self.exemptions.endpoint(route);
        self
    }

    /// Declares that every route under `prefix` skips the antiforgery header check.
    #[must_use]
    pub fn skip_antiforgery_group(mut self, prefix: impl AsRef<str>) -> Self {
        self.exemptions = self.exemptions.group(prefix);
        self
    }

    /// Build the server. The antiforgery exemptions are frozen here.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config is invalid, an
    /// antiforgery exemption is blank or malformed, or the principal store
    /// cannot be opened.
    pub async fn build(self) -> Result<Server, Error> {
        let exemptions = self.exemptions.with_options(&self.config.bff).build()?;
        let session_layer = create_session_layer(&self.config.session);
        let app_ctx = Arc::new(Context::new(self.config, exemptions));

        let router = self.router_factory.map(|factory| factory(&app_ctx));

        let app = BffApp::new(app_ctx.clone(), session_layer).await?;
        let router = app.create_bff_router(router);

        Ok(Server {
            router: router.with_state(app_ctx.clone()),
            config: app_ctx.config.clone(),
        })
    }
}
