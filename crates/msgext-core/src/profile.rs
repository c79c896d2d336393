use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::UserCredential;
use crate::errors::BoxError;

/// Caller identity as returned by the directory `/me` lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn fetch_self(&self, credential: &UserCredential) -> Result<Profile, BoxError>;
}
