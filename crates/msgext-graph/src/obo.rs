use async_trait::async_trait;
use chrono::{Duration, Utc};
use msgext_core::auth::{consent_required_response, sign_in_response};
use msgext_core::{
    AuthOutcome, AuthProvider, BoxError, OnBehalfOfConfig, TokenResponse, TurnContext,
};
use serde::Deserialize;
use tracing::{debug, warn};
use urlencoding::encode as url_encode;

use crate::error::GraphError;
use crate::{http_agent, jwt};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
/// AADSTS code for "the user or administrator has not consented".
const CONSENT_ERROR_CODE: u32 = 65001;

/// Exchanges the client's SSO token for a downstream token (OAuth 2.0 on-behalf-of).
///
/// Queries without an SSO token get a silent-auth envelope pointing at the login page;
/// exchanges the directory rejects for missing consent get invoke status 412.
#[derive(Clone)]
pub struct OnBehalfOfAuthProvider {
    agent: ureq::Agent,
}

impl OnBehalfOfAuthProvider {
    pub fn new() -> Self {
        Self::with_agent(http_agent())
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for OnBehalfOfAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for OnBehalfOfAuthProvider {
    async fn authenticate(
        &self,
        context: &TurnContext,
        config: &OnBehalfOfConfig,
        scopes: &[&str],
        login_endpoint: &str,
    ) -> Result<AuthOutcome, BoxError> {
        let sso_token = context
            .sso_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty());
        let Some(sso_token) = sso_token else {
            debug!("query carries no sso token; answering with silent auth");
            let response = sign_in_response(login_endpoint, scopes, config)?;
            return Ok(AuthOutcome::ConsentRequired(response));
        };

        let sso_token_expiration = jwt::expiration(sso_token)?;
        let url = config.token_endpoint();
        let form = exchange_form(config, sso_token, scopes);
        let agent = self.agent.clone();
        let reply = tokio::task::spawn_blocking(move || send_token_request(&agent, &url, &form))
            .await
            .map_err(GraphError::from)??;

        match reply {
            TokenReply::Granted(granted) => {
                let expires_in = granted.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
                Ok(AuthOutcome::Authenticated(TokenResponse {
                    sso_token: sso_token.to_string(),
                    sso_token_expiration,
                    token: granted.access_token,
                    expiration: Utc::now() + Duration::seconds(expires_in),
                    connection_name: String::new(),
                }))
            }
            TokenReply::InteractionRequired(aad) => {
                warn!(
                    error = %aad.error,
                    suberror = aad.suberror.as_deref().unwrap_or_default(),
                    "on-behalf-of exchange needs user consent"
                );
                Ok(AuthOutcome::ConsentRequired(consent_required_response()))
            }
        }
    }
}

pub(crate) fn exchange_form(config: &OnBehalfOfConfig, sso_token: &str, scopes: &[&str]) -> String {
    format!(
        "grant_type={}&client_id={}&client_secret={}&assertion={}&scope={}&requested_token_use=on_behalf_of",
        url_encode(JWT_BEARER_GRANT),
        url_encode(&config.client_id),
        url_encode(&config.client_secret),
        url_encode(sso_token),
        url_encode(&scopes.join(" ")),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrantedToken {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Error body of the v2 token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct AadError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_codes: Vec<u32>,
    #[serde(default)]
    suberror: Option<String>,
}

impl AadError {
    fn requires_interaction(&self) -> bool {
        matches!(self.error.as_str(), "interaction_required" | "consent_required")
            || self.suberror.as_deref() == Some("consent_required")
            || self.error_codes.contains(&CONSENT_ERROR_CODE)
            || self
                .error_description
                .as_deref()
                .is_some_and(|text| text.contains("AADSTS65001"))
    }
}

#[derive(Debug)]
pub(crate) enum TokenReply {
    Granted(GrantedToken),
    InteractionRequired(AadError),
}

pub(crate) fn send_token_request(
    agent: &ureq::Agent,
    url: &str,
    form: &str,
) -> Result<TokenReply, GraphError> {
    let mut resp = agent
        .post(url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .send(form)?;
    let status = resp.status().as_u16();
    let body = resp.body_mut().read_to_string()?;

    if (200..300).contains(&status) {
        let granted: GrantedToken = serde_json::from_str(&body)
            .map_err(|e| GraphError::Parse(format!("token response: {e}")))?;
        return Ok(TokenReply::Granted(granted));
    }

    match serde_json::from_str::<AadError>(&body) {
        Ok(aad) if aad.requires_interaction() => Ok(TokenReply::InteractionRequired(aad)),
        Ok(aad) => {
            warn!(status, error = %aad.error, "token endpoint rejected exchange");
            Err(GraphError::Status {
                endpoint: "token endpoint",
                status,
            })
        }
        Err(_) => Err(GraphError::Status {
            endpoint: "token endpoint",
            status,
        }),
    }
}
