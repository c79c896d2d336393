use serde::{Deserialize, Serialize};

use crate::errors::HandlerError;

/// Invoke name the platform uses for search-style queries.
pub const QUERY_INVOKE: &str = "composeExtension/query";

/// `value` payload of a `composeExtension/query` invoke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_options: Option<QueryOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<QueryAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl MessagingExtensionQuery {
    pub fn sso_token(&self) -> Option<&str> {
        self.authentication
            .as_ref()
            .and_then(|auth| auth.token.as_deref())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAuthentication {
    #[serde(default)]
    pub token: Option<String>,
}

/// The four stock search inputs, read by position.
///
/// Names on the wire are `StockIndex`, `NumberofStocks`, `P/B` and `P/E`, but only
/// the position is consulted. Values are carried for logging and do not narrow the
/// result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuery {
    pub stock_index: String,
    pub number_of_stocks: String,
    pub price_to_book: String,
    pub price_to_earnings: String,
}

impl StockQuery {
    pub fn from_parameters(parameters: &[QueryParameter]) -> Result<Self, HandlerError> {
        let value_at = |index: usize| {
            parameters
                .get(index)
                .map(|param| param.value.clone())
                .ok_or(HandlerError::ParameterOutOfRange {
                    index,
                    len: parameters.len(),
                })
        };
        Ok(Self {
            stock_index: value_at(0)?,
            number_of_stocks: value_at(1)?,
            price_to_book: value_at(2)?,
            price_to_earnings: value_at(3)?,
        })
    }
}
