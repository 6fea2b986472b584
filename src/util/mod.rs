mod config;
mod local_url;
pub mod logger;

pub use config::{
    load_config_from_dir, BffOptions, Config, LoggerConfig, OidcConfig, Routes, SameSiteConfig,
    SessionConfig, Verbosity, WebsiteConfig,
};
pub use local_url::{is_local_url, resolve_local_url};
