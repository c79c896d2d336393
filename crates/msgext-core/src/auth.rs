use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::config::OnBehalfOfConfig;
use crate::errors::BoxError;
use crate::response::{CardAction, PlatformResponse, ResponseEnvelope};

/// Delegated Graph scope needed to read the caller's profile.
pub const USER_READ_SCOPE: &str = "User.Read";
const SIGN_IN_ACTION_TITLE: &str = "Message Extension OAuth";

/// Per-turn request context handed over by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnContext {
    pub invoke_name: String,
    pub sso_token: Option<String>,
    pub user_id: Option<String>,
}

impl TurnContext {
    pub fn query(sso_token: Option<String>) -> Self {
        Self {
            invoke_name: crate::query::QUERY_INVOKE.to_string(),
            sso_token,
            user_id: None,
        }
    }
}

/// Result of a successful SSO exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub sso_token: String,
    pub sso_token_expiration: DateTime<Utc>,
    pub token: String,
    pub expiration: DateTime<Utc>,
    #[serde(default)]
    pub connection_name: String,
}

/// Credential bound to one user's exchanged token and the app registration.
#[derive(Clone)]
pub struct UserCredential {
    sso_token: String,
    access_token: String,
    config: OnBehalfOfConfig,
}

impl UserCredential {
    pub fn new(token: &TokenResponse, config: &OnBehalfOfConfig) -> Self {
        Self {
            sso_token: token.sso_token.clone(),
            access_token: token.token.clone(),
            config: config.clone(),
        }
    }

    pub fn sso_token(&self) -> &str {
        &self.sso_token
    }

    pub fn bearer(&self) -> &str {
        &self.access_token
    }

    pub fn tenant_id(&self) -> &str {
        &self.config.tenant_id
    }
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("tenant_id", &self.config.tenant_id)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

/// Outcome of the token exchange step.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(TokenResponse),
    /// The provider already built the response that asks the user to sign in or consent.
    ConsentRequired(PlatformResponse),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(
        &self,
        context: &TurnContext,
        config: &OnBehalfOfConfig,
        scopes: &[&str],
        login_endpoint: &str,
    ) -> Result<AuthOutcome, BoxError>;
}

/// Silent-auth envelope that points the client at the interactive sign-in page.
pub fn sign_in_envelope(
    login_endpoint: &str,
    scopes: &[&str],
    config: &OnBehalfOfConfig,
) -> ResponseEnvelope {
    let url = format!(
        "{login_endpoint}?scope={}&clientId={}&tenantId={}",
        encode(&scopes.join(" ")),
        encode(&config.client_id),
        encode(&config.tenant_id),
    );
    ResponseEnvelope::silent_auth(CardAction {
        kind: "openUrl".to_string(),
        value: url,
        title: SIGN_IN_ACTION_TITLE.to_string(),
    })
}

pub fn sign_in_response(
    login_endpoint: &str,
    scopes: &[&str],
    config: &OnBehalfOfConfig,
) -> Result<PlatformResponse, serde_json::Error> {
    PlatformResponse::envelope(&sign_in_envelope(login_endpoint, scopes, config))
}

/// Invoke status that tells the client to run the consent flow.
pub fn consent_required_response() -> PlatformResponse {
    PlatformResponse::status(412)
}
