mod antiforgery;
mod bff_app;
pub mod router;

pub use {
    antiforgery::{AntiforgeryExemptions, AntiforgeryExemptionsBuilder},
    bff_app::BffApp,
};
