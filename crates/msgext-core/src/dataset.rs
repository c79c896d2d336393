use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::HandlerError;

/// One bundled stock entry. Display fields beyond symbol and name are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub symbol: String,
    pub company_name: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl StockRecord {
    /// Record as template data, with `symbol` and `companyName` alongside the details.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Immutable, shareable list of records in their bundled order.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDataset {
    records: Arc<[StockRecord]>,
}

impl StockDataset {
    pub fn new(records: Vec<StockRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, HandlerError> {
        let records: Vec<StockRecord> = serde_json::from_str(text)
            .map_err(|err| HandlerError::Dataset(err.to_string()))?;
        Ok(Self::new(records))
    }

    /// Sample data shipped with the crate.
    pub fn bundled() -> Result<Self, HandlerError> {
        Self::from_json(include_str!("../assets/stock.data.json"))
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
