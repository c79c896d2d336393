//! Core of the stock search messaging extension.
//! This crate owns the query model, the compose-extension response envelope, the
//! collaborator seams (SSO token exchange, profile lookup, card rendering) and the
//! [`QueryHandler`] that wires them together for one query turn.

pub mod auth;
pub mod cards;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod handler;
pub mod profile;
pub mod query;
pub mod response;

pub use auth::{AuthOutcome, AuthProvider, TokenResponse, TurnContext, UserCredential};
pub use cards::{Attachment, CardRenderer, CardTemplate, TemplateCardRenderer};
pub use config::{AppConfig, OnBehalfOfConfig};
pub use dataset::{StockDataset, StockRecord};
pub use errors::{BoxError, ConfigError, HandlerError, RenderError};
pub use handler::QueryHandler;
pub use profile::{Profile, ProfileClient};
pub use query::{MessagingExtensionQuery, QueryParameter, StockQuery};
pub use response::{
    AttachmentLayout, CardAction, ComposeExtension, PlatformResponse, QueryResponse,
    ResponseEnvelope, ResultAttachment, SuggestedActions,
};
