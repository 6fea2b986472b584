//! Antiforgery exemptions.
//!
//! Endpoints, or groups of endpoints, declare at startup that the CSRF header
//! check should not apply to them. The enforcing middleware asks
//! [`AntiforgeryExemptions::is_exempt`] with the route the request matched.
//! Declarations are frozen by [`AntiforgeryExemptionsBuilder::build`].

use std::{collections::HashSet, sync::Arc};

use {
    axum::{extract::MatchedPath, http::Request},
    tracing::{info, warn},
};

use crate::{util::BffOptions, Error};

#[derive(Debug, Default)]
struct Declarations {
    endpoints: HashSet<String>,
    groups: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct AntiforgeryExemptions {
    declarations: Arc<Declarations>,
}

impl AntiforgeryExemptions {
    #[must_use]
    pub fn builder() -> AntiforgeryExemptionsBuilder {
        AntiforgeryExemptionsBuilder::default()
    }

    /// Whether the matched route carries the exemption.
    #[must_use]
    pub fn is_exempt(&self, endpoint: &MatchedPath) -> bool {
        self.is_exempt_route(endpoint.as_str())
    }

    /// Whether the route pattern (as registered with the router, e.g.
    /// `/hooks/:provider`) carries the exemption.
    #[must_use]
    pub fn is_exempt_route(&self, route: &str) -> bool {
        self.declarations.endpoints.contains(route)
            || self
                .declarations
                .groups
                .iter()
                .any(|group| in_group(group, route))
    }

    /// Unmatched requests are never exempt.
    #[must_use]
    pub fn is_exempt_request<B>(&self, request: &Request<B>) -> bool {
        request
            .extensions()
            .get::<MatchedPath>()
            .is_some_and(|endpoint| self.is_exempt(endpoint))
    }
}

const CATCH_ALL: &str = "/";

fn in_group(group: &str, route: &str) -> bool {
    group == CATCH_ALL
        || route
            .strip_prefix(group)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// `None` for a blank prefix. Only an explicit `/` covers every route.
fn normalize_group(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.trim_end_matches('/');
    Some(if trimmed.is_empty() {
        CATCH_ALL.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    })
}

/// Route patterns are registered with a leading `/` and compared verbatim.
fn is_route_pattern(route: &str) -> bool {
    route.starts_with('/') && route.trim() == route
}

#[derive(Debug, Default)]
pub struct AntiforgeryExemptionsBuilder {
    endpoints: HashSet<String>,
    groups: Vec<String>,
    rejected: Vec<String>,
}

impl AntiforgeryExemptionsBuilder {
    /// Exempts the single route registered under `route`.
    #[must_use]
    pub fn endpoint(mut self, route: impl Into<String>) -> Self {
        let route = route.into();
        if is_route_pattern(&route) {
            self.endpoints.insert(route);
        } else {
            warn!(route = %route, "Exempt endpoint is not a route pattern");
            self.rejected.push(format!("endpoint {route:?}"));
        }
        self
    }

    /// Exempts every route registered under `prefix`.
    #[must_use]
    pub fn group(mut self, prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        match normalize_group(prefix) {
            Some(group) => {
                if !self.groups.contains(&group) {
                    self.groups.push(group);
                }
            }
            None => {
                warn!(prefix = %prefix, "Blank exempt group prefix");
                self.rejected.push(format!("group {prefix:?}"));
            }
        }
        self
    }

    #[must_use]
    pub fn with_options(self, options: &BffOptions) -> Self {
        let this = options
            .antiforgery_exempt_endpoints
            .iter()
            .fold(self, |builder, route| builder.endpoint(route.as_str()));
        options
            .antiforgery_exempt_groups
            .iter()
            .fold(this, |builder, prefix| builder.group(prefix))
    }

    /// Freezes the declarations.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming every declaration that was blank
    /// or not a route pattern.
    pub fn build(self) -> Result<AntiforgeryExemptions, Error> {
        if !self.rejected.is_empty() {
            return Err(Error::ConfigError(format!(
                "invalid antiforgery exemptions: {}",
                self.rejected.join(", ")
            )));
        }

        for route in &self.endpoints {
            info!(route = %route, "Antiforgery check skipped for endpoint");
        }
        for group in &self.groups {
            if group == CATCH_ALL {
                warn!("Antiforgery check skipped for every route");
            } else {
                info!(group = %group, "Antiforgery check skipped for group");
            }
        }

        Ok(AntiforgeryExemptions {
            declarations: Arc::new(Declarations {
                endpoints: self.endpoints,
                groups: self.groups,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::State,
        http::StatusCode,
        middleware::{from_fn_with_state, Next},
        response::{IntoResponse, Response},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    use super::*;

    const CSRF_HEADER: &str = "x-csrf";

    impl AntiforgeryExemptionsBuilder {
        fn rejected_dropped(mut self) -> Self {
            self.rejected.clear();
            self
        }
    }

    #[test]
    fn test_declared_endpoint_is_exempt() {
        let exemptions = AntiforgeryExemptions::builder()
            .endpoint("/hooks/idp")
            .build()
            .expect("exemptions");

        assert!(exemptions.is_exempt_route("/hooks/idp"));
        assert!(!exemptions.is_exempt_route("/hooks/other"));
        assert!(!exemptions.is_exempt_route("/hooks/idp/extra"));
        assert!(!exemptions.is_exempt_route("/api/data"));
    }

    #[test]
    fn test_declared_group_is_exempt() {
        let exemptions = AntiforgeryExemptions::builder()
            .group("/public/")
            .build()
            .expect("exemptions");

        assert!(exemptions.is_exempt_route("/public"));
        assert!(exemptions.is_exempt_route("/public/feed"));
        assert!(exemptions.is_exempt_route("/public/items/:id"));
        assert!(!exemptions.is_exempt_route("/publicity"));
        assert!(!exemptions.is_exempt_route("/private/feed"));
    }

    #[test]
    fn test_nothing_declared() {
        let exemptions = AntiforgeryExemptions::default();
        assert!(!exemptions.is_exempt_route("/"));
        assert!(!exemptions.is_exempt_route("/bff/logout"));
    }

    #[test]
    fn test_declarations_from_options() {
        let options = BffOptions {
            antiforgery_exempt_endpoints: vec!["/hooks/idp".to_string()],
            antiforgery_exempt_groups: vec!["public".to_string()],
            ..BffOptions::default()
        };

        let exemptions = AntiforgeryExemptions::builder()
            .with_options(&options)
            .endpoint("/status")
            .build()
            .expect("exemptions");

        assert!(exemptions.is_exempt_route("/hooks/idp"));
        assert!(exemptions.is_exempt_route("/public/feed"));
        assert!(exemptions.is_exempt_route("/status"));
        assert!(!exemptions.is_exempt_route("/api"));
    }

    #[test]
    fn test_unmatched_request_is_not_exempt() {
        let exemptions = AntiforgeryExemptions::builder()
            .group("/")
            .build()
            .expect("exemptions");
        let request = Request::builder()
            .uri("/anything")
            .body(())
            .expect("request");
        assert!(!exemptions.is_exempt_request(&request));
    }

    #[test]
    fn test_blank_groups_are_rejected() {
        let options = BffOptions {
            antiforgery_exempt_groups: vec![String::new(), "  ".to_string()],
            ..BffOptions::default()
        };

        let result = AntiforgeryExemptions::builder()
            .with_options(&options)
            .build();

        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_blank_group_is_not_a_prefix_of_every_route() {
        assert_eq!(normalize_group(""), None);
        assert_eq!(normalize_group(" \t"), None);

        let exemptions = AntiforgeryExemptions::builder()
            .group("/public")
            .group("  ")
            .rejected_dropped()
            .build()
            .expect("exemptions");
        assert!(!exemptions.is_exempt_route("/api/transfer"));
        assert!(!exemptions.is_exempt_route("/bff/logout"));
        assert!(exemptions.is_exempt_route("/public/feed"));
    }

    #[test]
    fn test_explicit_root_group_covers_every_route() {
        assert_eq!(normalize_group("/"), Some("/".to_string()));
        assert_eq!(normalize_group(" // "), Some("/".to_string()));

        let exemptions = AntiforgeryExemptions::builder()
            .group("/")
            .build()
            .expect("exemptions");
        assert!(exemptions.is_exempt_route("/"));
        assert!(exemptions.is_exempt_route("/api/transfer"));
    }

    #[test]
    fn test_malformed_endpoints_are_rejected() {
        for route in ["hooks/idp", "", " /hooks/idp", "/hooks/idp "] {
            let result = AntiforgeryExemptions::builder().endpoint(route).build();
            assert!(
                matches!(result, Err(Error::ConfigError(_))),
                "{route:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejection_names_every_bad_declaration() {
        let Err(Error::ConfigError(message)) = AntiforgeryExemptions::builder()
            .endpoint("/hooks/idp")
            .endpoint("status")
            .group("")
            .build()
        else {
            panic!("expected a configuration error");
        };

        assert!(message.contains("\"status\""));
        assert!(message.contains("group \"\""));
        assert!(!message.contains("/hooks/idp"));
    }

    async fn require_csrf_header(
        State(exemptions): State<AntiforgeryExemptions>,
        request: Request<Body>,
        next: Next,
    ) -> Response {
        if exemptions.is_exempt_request(&request) || request.headers().contains_key(CSRF_HEADER) {
            next.run(request).await
        } else {
            StatusCode::UNAUTHORIZED.into_response()
        }
    }

    fn app(exemptions: AntiforgeryExemptions) -> Router {
        Router::new()
            .route("/api/data", post(|| async { "data" }))
            .route("/hooks/:provider", post(|| async { "hook" }))
            .route("/public/feed", get(|| async { "feed" }))
            .layer(from_fn_with_state(exemptions, require_csrf_header))
    }

    async fn status(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
        .status()
    }

    #[tokio::test]
    async fn test_enforcing_middleware_consults_matched_route() {
        let app = app(AntiforgeryExemptions::builder()
            .endpoint("/hooks/:provider")
            .group("/public")
            .build()
            .expect("exemptions"));

        assert_eq!(
            status(app.clone(), "POST", "/hooks/github").await,
            StatusCode::OK
        );
        assert_eq!(
            status(app.clone(), "GET", "/public/feed").await,
            StatusCode::OK
        );
        assert_eq!(
            status(app, "POST", "/api/data").await,
            StatusCode::UNAUTHORIZED
        );
    }
}
