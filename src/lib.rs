#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod app;
mod error;
pub mod model;
pub mod oidc;
pub mod util;
pub mod web;

use oidc::backend::Backend;

pub use {
    app::{
        middleware::bff::{bff_middleware, BffMiddlewareMarker},
        BffRouter, Builder, Context, Server,
    },
    error::{Error, ErrorKind},
    util::{load_config_from_dir, Config},
    web::AntiforgeryExemptions,
};

pub type AuthSession = axum_login::AuthSession<Backend>;
