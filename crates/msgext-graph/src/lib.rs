//! HTTP-backed collaborators for the stock search messaging extension.
//!
//! [`OnBehalfOfAuthProvider`] trades the client's SSO token for a Graph token with a
//! single form post to the tenant token endpoint; [`GraphProfileClient`] reads `/me`
//! with that token. Both use a blocking `ureq` agent driven from the tokio blocking
//! pool.

pub mod error;
pub mod graph;
pub mod jwt;
pub mod obo;

pub use error::GraphError;
pub use graph::{DEFAULT_GRAPH_BASE, GraphProfileClient};
pub use obo::OnBehalfOfAuthProvider;

/// Agent that hands non-2xx responses back as responses so error bodies can be read.
pub fn http_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}
