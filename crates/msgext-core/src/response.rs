use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cards::Attachment;

/// One selectable result: the full card plus the compact preview shown in the list.
///
/// The preview goes out under `preview`, the field name the compose extension
/// result contract reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultAttachment {
    #[serde(flatten)]
    pub card: Attachment,
    pub preview: Attachment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentLayout {
    #[default]
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedActions {
    pub actions: Vec<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComposeExtension {
    #[serde(rename_all = "camelCase")]
    Result {
        attachment_layout: AttachmentLayout,
        attachments: Vec<ResultAttachment>,
    },
    #[serde(rename_all = "camelCase")]
    SilentAuth { suggested_actions: SuggestedActions },
}

/// Body returned to the chat client for a compose extension invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub compose_extension: ComposeExtension,
}

impl ResponseEnvelope {
    pub fn results(attachments: Vec<ResultAttachment>) -> Self {
        Self {
            compose_extension: ComposeExtension::Result {
                attachment_layout: AttachmentLayout::List,
                attachments,
            },
        }
    }

    pub fn silent_auth(action: CardAction) -> Self {
        Self {
            compose_extension: ComposeExtension::SilentAuth {
                suggested_actions: SuggestedActions {
                    actions: vec![action],
                },
            },
        }
    }

    /// Result attachments, empty for sign-in envelopes.
    pub fn attachments(&self) -> &[ResultAttachment] {
        match &self.compose_extension {
            ComposeExtension::Result { attachments, .. } => attachments,
            ComposeExtension::SilentAuth { .. } => &[],
        }
    }
}

/// Invoke response handed back to the hosting platform: a status plus optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl PlatformResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn envelope(envelope: &ResponseEnvelope) -> Result<Self, serde_json::Error> {
        Ok(Self::ok(serde_json::to_value(envelope)?))
    }
}

/// What a query turn produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    Results(ResponseEnvelope),
    SignIn(PlatformResponse),
}

impl QueryResponse {
    pub fn into_platform_response(self) -> Result<PlatformResponse, serde_json::Error> {
        match self {
            QueryResponse::Results(envelope) => PlatformResponse::envelope(&envelope),
            QueryResponse::SignIn(response) => Ok(response),
        }
    }
}
