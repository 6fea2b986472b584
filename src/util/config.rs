#![allow(clippy::module_name_repetitions)]

use std::{fs, path::Path};

use {
    derivative::Derivative,
    serde::{Deserialize, Serialize},
    strum::{Display, EnumString, VariantNames},
    toml::{map::Map, Value},
    tracing::{debug, Level},
};

use crate::Error;

const DEFAULT_CONFIG_FILE: &str = "default.toml";
const LOCAL_CONFIG_FILE: &str = "local.toml";

#[derive(
    Default,
    Display,
    EnumString,
    VariantNames,
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
)]
pub enum Verbosity {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<Verbosity> for Level {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Trace => Self::TRACE,
            Verbosity::Debug => Self::DEBUG,
            Verbosity::Info => Self::INFO,
            Verbosity::Warn => Self::WARN,
            Verbosity::Error => Self::ERROR,
        }
    }
}

#[derive(Default, Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggerConfig {
    pub verbosity: Verbosity,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct WebsiteConfig {
    #[derivative(Default(value = "\"127.0.0.1\".into()"))]
    pub bind_address: String,
    #[derivative(Default(value = "8080"))]
    pub bind_port: u16,
    /// Scheme, host and port the browser sees, e.g. `https://app.example.com`.
    /// Used to turn local redirect targets into absolute URLs for the IdP.
    #[derivative(Default(value = "\"http://localhost:8080\".into()"))]
    pub public_origin: String,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct SessionConfig {
    pub same_site_policy: SameSiteConfig,
    pub secure: bool,
    #[derivative(Default(value = "1"))]
    pub inactivity_days: i64,
}

#[derive(
    Default, Display, EnumString, VariantNames, Debug, Serialize, Deserialize, Clone, PartialEq, Eq,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SameSiteConfig {
    Strict,
    #[default]
    Lax,
    None,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct Routes {
    #[derivative(Default(value = "\"/\".into()"))]
    pub root: String,
    #[derivative(Default(value = "\"bff\".into()"))]
    pub bff_base: String,
    #[derivative(Default(value = "\"logout\".into()"))]
    pub logout: String,
}

impl Routes {
    /// Returns a new `Routes` struct with the `root` path prepended to all paths.
    /// `logout` is nested under `bff_base`. Every path starts with `/`, whatever
    /// form `root` was configured in.
    #[must_use]
    pub fn with_root(&self) -> Self {
        let normalized_base = normalize_slash(&self.path_base().unwrap_or_default());
        let bff_base = join_paths(&normalized_base, &self.bff_base);
        Self {
            root: normalized_base,
            logout: join_paths(&bff_base, &self.logout),
            bff_base,
        }
    }

    /// The path the application is mounted under, if it is not mounted at `/`.
    #[must_use]
    pub fn path_base(&self) -> Option<String> {
        let trimmed = self.root.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else if trimmed.starts_with('/') {
            Some(trimmed.to_string())
        } else {
            Some(format!("/{trimmed}"))
        }
    }
}

fn normalize_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn join_paths(base: &str, path: &str) -> String {
    let trimmed_base = base.trim_end_matches('/');
    let trimmed_path = path.trim_start_matches('/');
    format!("{trimmed_base}/{trimmed_path}")
}

/// Process-wide BFF behaviour. Read by every logout request, never mutated.
#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct BffOptions {
    /// An authenticated user with a `sid` claim must pass the same value as the
    /// `sid` query parameter to log out.
    #[derivative(Default(value = "true"))]
    pub require_logout_session_id: bool,

    /// Fail BFF endpoints when the BFF middleware did not run for the request.
    #[derivative(Default(value = "true"))]
    pub enforce_bff_middleware: bool,

    /// Route patterns that skip the antiforgery header check.
    pub antiforgery_exempt_endpoints: Vec<String>,

    /// Route prefixes whose endpoints all skip the antiforgery header check.
    pub antiforgery_exempt_groups: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    pub end_session_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Derivative, Clone)]
#[derivative(Default)]
#[serde(default)]
pub struct Config {
    pub run_mode: Option<String>,
    pub website: WebsiteConfig,
    pub logger: LoggerConfig,
    pub session: SessionConfig,
    pub routes: Routes,
    pub bff: BffOptions,
    pub oidc: Option<OidcConfig>,
}

/// Loads `default.toml` from `dir`, then merges `local.toml` over it if present.
///
/// # Errors
///
/// Returns an error if `default.toml` is missing, either file is not valid
/// TOML, or the merged document does not describe a [`Config`].
pub fn load_config_from_dir(dir: impl AsRef<Path>) -> Result<Config, Error> {
    let dir = dir.as_ref();

    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    debug!(path = %default_path.display(), "Loading config");
    let mut merged: Value = toml::from_str(&fs::read_to_string(&default_path)?)?;

    let local_path = dir.join(LOCAL_CONFIG_FILE);
    if local_path.exists() {
        debug!(path = %local_path.display(), "Merging local config overrides");
        let local: Value = toml::from_str(&fs::read_to_string(&local_path)?)?;
        merge_values(&mut merged, local);
    }

    Ok(merged.try_into::<Config>()?)
}

fn merge_values(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Table(base), Value::Table(overrides)) => merge_tables(base, overrides),
        (base, overrides) => *base = overrides,
    }
}

fn merge_tables(base: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}
