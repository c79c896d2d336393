use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const LOGIN_PAGE: &str = "auth-start.html";

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

/// Process-wide app registration settings, read once at startup.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    pub client_id: String,
    pub tenant_id: String,
    pub client_secret: String,
    pub bot_domain: String,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("client_id"));
        }
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::Missing("tenant_id"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("client_secret"));
        }
        if self.bot_domain.trim().is_empty() {
            return Err(ConfigError::Missing("bot_domain"));
        }
        if !(self.authority_host.starts_with("http://")
            || self.authority_host.starts_with("https://"))
        {
            return Err(ConfigError::NotAbsoluteUrl {
                field: "authority_host",
                value: self.authority_host.clone(),
            });
        }
        if self.bot_domain.contains("://") || self.bot_domain.contains('/') {
            return Err(ConfigError::BotDomain(self.bot_domain.clone()));
        }
        Ok(())
    }

    /// Credentials used for the on-behalf-of exchange.
    pub fn on_behalf_of(&self) -> OnBehalfOfConfig {
        OnBehalfOfConfig {
            authority_host: self.authority_host.clone(),
            client_id: self.client_id.clone(),
            tenant_id: self.tenant_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    /// Page the client opens when it has to fall back to an interactive sign-in.
    pub fn initiate_login_endpoint(&self) -> String {
        format!("https://{}/{LOGIN_PAGE}", self.bot_domain.trim())
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("authority_host", &self.authority_host)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_secret", &"<redacted>")
            .field("bot_domain", &self.bot_domain)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct OnBehalfOfConfig {
    pub authority_host: String,
    pub client_id: String,
    pub tenant_id: String,
    pub client_secret: String,
}

impl OnBehalfOfConfig {
    /// v2 token endpoint for the configured tenant.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl fmt::Debug for OnBehalfOfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnBehalfOfConfig")
            .field("authority_host", &self.authority_host)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
