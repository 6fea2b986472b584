use {tracing::debug, url::Url};

use crate::{model::User, util::OidcConfig, Error};

/// Builds RP-initiated logout redirects to the IdP's end-session endpoint.
#[derive(Debug, Clone)]
pub struct EndSession {
    endpoint: Url,
    client_id: Option<String>,
    public_origin: Url,
}

impl EndSession {
    /// # Errors
    ///
    /// Returns an error if the end-session URI or the public origin is not an absolute URL.
    pub fn from_config(config: &OidcConfig, public_origin: &str) -> Result<Self, Error> {
        Ok(Self {
            endpoint: Url::parse(&config.end_session_uri)?,
            client_id: config.client_id.clone(),
            public_origin: Url::parse(public_origin)?,
        })
    }

    /// The IdP URL that ends the upstream session and then sends the browser
    /// to `return_target`, an application-local path.
    ///
    /// # Errors
    ///
    /// Returns an error if `return_target` cannot be resolved against the public origin.
    pub fn sign_out_url(&self, user: Option<&User>, return_target: &str) -> Result<Url, Error> {
        let post_logout_redirect_uri = self.public_origin.join(return_target)?;

        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(id_token) = user.and_then(|u| u.id_token.as_deref()) {
                query.append_pair("id_token_hint", id_token);
            }
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
            query.append_pair("post_logout_redirect_uri", post_logout_redirect_uri.as_str());
        }

        debug!(endpoint = %self.endpoint, %post_logout_redirect_uri, "Built end-session redirect");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_session(client_id: Option<&str>) -> EndSession {
        EndSession::from_config(
            &OidcConfig {
                end_session_uri: "https://idp.example/connect/endsession".to_string(),
                client_id: client_id.map(ToString::to_string),
            },
            "https://app.example.com",
        )
        .expect("valid config")
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_sign_out_url_with_user() {
        let user = User {
            id_token: Some("token".to_string()),
            ..User::default()
        };

        let url = end_session(Some("spa"))
            .sign_out_url(Some(&user), "/app/goodbye")
            .expect("url");

        assert_eq!(url.host_str(), Some("idp.example"));
        assert_eq!(url.path(), "/connect/endsession");
        assert_eq!(
            query(&url),
            vec![
                ("id_token_hint".to_string(), "token".to_string()),
                ("client_id".to_string(), "spa".to_string()),
                (
                    "post_logout_redirect_uri".to_string(),
                    "https://app.example.com/app/goodbye".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_sign_out_url_anonymous() {
        let url = end_session(None).sign_out_url(None, "/").expect("url");
        assert_eq!(
            query(&url),
            vec![(
                "post_logout_redirect_uri".to_string(),
                "https://app.example.com/".to_string()
            )]
        );
    }

    #[test]
    fn test_relative_end_session_uri_is_rejected() {
        let result = EndSession::from_config(
            &OidcConfig {
                end_session_uri: "/connect/endsession".to_string(),
                client_id: None,
            },
            "https://app.example.com",
        );
        assert!(matches!(result, Err(Error::ParseError(_))));
    }
}
