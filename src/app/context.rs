use std::sync::Arc;

use axum::{extract::FromRef, Router};

use crate::{web::AntiforgeryExemptions, Config};

/// Immutable, process-wide state shared by every request.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub exemptions: AntiforgeryExemptions,
}

impl Context {
    #[must_use]
    pub const fn new(config: Config, exemptions: AntiforgeryExemptions) -> Self {
        Self { config, exemptions }
    }
}

pub type BffRouter = Router<Arc<Context>>;

impl FromRef<Arc<Context>> for Config {
    fn from_ref(state: &Arc<Context>) -> Self {
        state.config.clone()
    }
}

impl FromRef<Arc<Context>> for AntiforgeryExemptions {
    fn from_ref(state: &Arc<Context>) -> Self {
        state.exemptions.clone()
    }
}
