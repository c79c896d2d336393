use async_trait::async_trait;
use tracing::debug;
use msgext_core::{BoxError, Profile, ProfileClient, UserCredential};

use crate::error::GraphError;
use crate::http_agent;

pub const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Reads the signed-in user's profile from Graph `/me`.
#[derive(Clone)]
pub struct GraphProfileClient {
    agent: ureq::Agent,
    graph_base: String,
}

impl GraphProfileClient {
    pub fn new(graph_base: impl Into<String>) -> Self {
        Self::with_agent(http_agent(), graph_base)
    }

    pub fn with_agent(agent: ureq::Agent, graph_base: impl Into<String>) -> Self {
        Self {
            agent,
            graph_base: graph_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn me_url(&self) -> String {
        format!("{}/me", self.graph_base)
    }
}

impl Default for GraphProfileClient {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPH_BASE)
    }
}

#[async_trait]
impl ProfileClient for GraphProfileClient {
    async fn fetch_self(&self, credential: &UserCredential) -> Result<Profile, BoxError> {
        let agent = self.agent.clone();
        let url = self.me_url();
        let bearer = format!("Bearer {}", credential.bearer());
        debug!(tenant_id = credential.tenant_id(), url = %url, "fetching signed-in profile");
        let profile = tokio::task::spawn_blocking(move || get_profile(&agent, &url, &bearer))
            .await
            .map_err(GraphError::from)??;
        Ok(profile)
    }
}

fn get_profile(agent: &ureq::Agent, url: &str, bearer: &str) -> Result<Profile, GraphError> {
    let mut resp = agent
        .get(url)
        .header("Authorization", bearer)
        .header("Accept", "application/json")
        .call()?;
    let status = resp.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(GraphError::Status {
            endpoint: "graph /me",
            status,
        });
    }
    let body = resp.body_mut().read_to_string()?;
    serde_json::from_str(&body).map_err(|e| GraphError::Parse(format!("profile: {e}")))
}
