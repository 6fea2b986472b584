mod builder;
mod context;
pub mod middleware;
mod server;

pub use {
    builder::Builder,
    context::{BffRouter, Context},
    server::Server,
};
