use msgext_core::{MessagingExtensionQuery, TurnContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INVOKE_ACTIVITY: &str = "invoke";

/// The subset of a Bot Framework activity the endpoint reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub from: Option<ChannelAccount>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub aad_object_id: Option<String>,
}

impl Activity {
    pub fn is_invoke(&self) -> bool {
        self.kind == INVOKE_ACTIVITY
    }

    pub fn invoke_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Decodes `value` as a compose extension query.
    pub fn query(&self) -> Result<MessagingExtensionQuery, serde_json::Error> {
        match &self.value {
            Some(value) => serde_json::from_value(value.clone()),
            None => Ok(MessagingExtensionQuery::default()),
        }
    }

    pub fn turn_context(&self, query: &MessagingExtensionQuery) -> TurnContext {
        TurnContext {
            invoke_name: self.invoke_name().to_string(),
            sso_token: query.sso_token().map(str::to_string),
            user_id: self
                .from
                .as_ref()
                .map(|from| from.aad_object_id.clone().unwrap_or_else(|| from.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_query_invoke() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "invoke",
            "id": "f:123",
            "name": "composeExtension/query",
            "channelId": "msteams",
            "from": { "id": "29:abc", "name": "Megan", "aadObjectId": "48d31887" },
            "value": {
                "commandId": "findStocks",
                "parameters": [{ "name": "StockIndex", "value": "NASDAQ" }],
                "authentication": { "token": "sso" }
            },
            "serviceUrl": "https://smba.trafficmanager.net/amer/"
        }))
        .expect("activity");

        assert!(activity.is_invoke());
        assert_eq!(activity.invoke_name(), "composeExtension/query");
        let query = activity.query().expect("query");
        let context = activity.turn_context(&query);
        assert_eq!(context.sso_token.as_deref(), Some("sso"));
        assert_eq!(context.user_id.as_deref(), Some("48d31887"));
        assert_eq!(query.parameters.len(), 1);
    }

    #[test]
    fn message_activity_has_no_invoke_name() {
        let activity: Activity =
            serde_json::from_value(json!({"type": "message", "text": "hi"})).expect("activity");
        assert!(!activity.is_invoke());
        assert_eq!(activity.invoke_name(), "");
        assert_eq!(activity.query().expect("query"), MessagingExtensionQuery::default());
    }

    #[test]
    fn malformed_query_value_is_an_error() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "invoke",
            "name": "composeExtension/query",
            "value": { "parameters": "NASDAQ" }
        }))
        .expect("activity");
        assert!(activity.query().is_err());
    }
}
