use std::sync::Arc;

use {
    axum::{
        extract::{Extension, RawQuery},
        response::Redirect,
        routing::get,
        Router,
    },
    tracing::{debug, error, warn},
    typed_builder::TypedBuilder,
    url::form_urlencoded,
};

use crate::{
    app::middleware::bff::BffMiddlewareMarker,
    oidc::{end_session::EndSession, RETURN_URL_PARAM, SESSION_ID_PARAM},
    util::{is_local_url, resolve_local_url, BffOptions},
    AuthSession, Error,
};

/// The query parameters a logout request may carry. The first value wins
/// when a key repeats.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogoutParams {
    pub session_id: Option<String>,
    pub return_url: Option<String>,
}

impl LogoutParams {
    #[must_use]
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match &*key {
                SESSION_ID_PARAM => &mut params.session_id,
                RETURN_URL_PARAM => &mut params.return_url,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Ends a browser session: local cookie first, then the IdP session.
#[derive(Debug, TypedBuilder)]
pub struct Logout {
    options: BffOptions,
    #[builder(default)]
    path_base: Option<String>,
    #[builder(default)]
    end_session: Option<EndSession>,
}

impl Logout {
    /// Runs the logout protocol for one request. Each step either completes or
    /// aborts the request; the local session is only cleared once the
    /// session-binding check has passed.
    ///
    /// # Errors
    ///
    /// * [`Error::MissingBffMiddleware`] / [`Error::MissingAuthSession`] if the
    ///   router is not wired with the BFF middleware and auth layer.
    /// * [`Error::InvalidSessionId`] if the `sid` parameter does not match the
    ///   user's session.
    /// * [`Error::SessionError`] / [`Error::Sqlx`] if the session or the
    ///   principal recorded for it cannot be removed.
    /// * [`Error::NonLocalReturnUrl`] if `returnUrl` leaves the application.
    pub async fn process(
        &self,
        marker: Option<BffMiddlewareMarker>,
        auth_session: Option<AuthSession>,
        params: LogoutParams,
    ) -> Result<Redirect, Error> {
        if self.options.enforce_bff_middleware && marker.is_none() {
            error!("Logout endpoint reached without the BFF middleware");
            return Err(Error::MissingBffMiddleware);
        }

        let Some(mut auth_session) = auth_session else {
            error!("Logout endpoint reached without an auth session");
            return Err(Error::MissingAuthSession);
        };

        if let Some(user) = &auth_session.user {
            if let Some(session_id) = user.session_id() {
                if self.options.require_logout_session_id
                    && params.session_id.as_deref() != Some(session_id)
                {
                    warn!(subject = %user.subject, "Logout rejected: session id mismatch");
                    return Err(Error::InvalidSessionId);
                }
            }
        } else {
            debug!("Logout requested without an authenticated session");
        }

        let user = auth_session.logout().await.map_err(|e| {
            error!("Error clearing the local session: {:?}", e);
            Error::SessionError(e.to_string())
        })?;
        debug!(had_user = user.is_some(), "Local session cleared");

        if let Some(user) = &user {
            auth_session
                .backend
                .remove(user.id)
                .await
                .inspect_err(|e| error!("Error removing the principal: {:?}", e))?;
        }

        let return_target = self.resolve_return_target(params.return_url.as_deref())?;

        match &self.end_session {
            Some(end_session) => {
                let url = end_session.sign_out_url(user.as_ref(), &return_target)?;
                debug!(%return_target, "Redirecting to the IdP for sign-out");
                Ok(Redirect::to(url.as_str()))
            }
            None => {
                debug!(%return_target, "No IdP sign-out configured, redirecting");
                Ok(Redirect::to(&return_target))
            }
        }
    }

    fn resolve_return_target(&self, return_url: Option<&str>) -> Result<String, Error> {
        match return_url.filter(|url| !url.trim().is_empty()) {
            Some(url) if is_local_url(url) => {
                Ok(resolve_local_url(url, self.path_base.as_deref()))
            }
            Some(url) => {
                warn!(return_url = %url, "Logout rejected: returnUrl is not application local");
                Err(Error::NonLocalReturnUrl(url.to_string()))
            }
            None => Ok(self.path_base.clone().unwrap_or_else(|| "/".to_string())),
        }
    }

    pub fn router<S>(self, logout_path: &str) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let this = Arc::new(self);
        Router::new().route(
            logout_path,
            get(
                move |marker: Option<Extension<BffMiddlewareMarker>>,
                      auth_session: Option<AuthSession>,
                      RawQuery(query): RawQuery| {
                    let this = this.clone();
                    async move {
                        let params = LogoutParams::from_query(query.as_deref());
                        this.process(marker.map(|Extension(m)| m), auth_session, params)
                            .await
                    }
                },
            ),
        )
    }
}
