//! Card rendering seam.
//!
//! [`TemplateCardRenderer`] binds `${field}` expressions in an Adaptive Card template
//! against a JSON object. It covers plain and dotted field references only; `$data`,
//! `$when` and template functions are not evaluated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::errors::RenderError;

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";

/// A platform attachment: content type plus card payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: Value,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>, content: Value) -> Self {
        Self {
            content_type: content_type.into(),
            content,
        }
    }
}

/// Parsed Adaptive Card template.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTemplate {
    body: Value,
}

impl CardTemplate {
    pub fn from_json(text: &str) -> Result<Self, RenderError> {
        let body: Value = serde_json::from_str(text)?;
        Self::from_value(body)
    }

    pub fn from_value(body: Value) -> Result<Self, RenderError> {
        if !body.is_object() {
            return Err(RenderError::from("card template must be a JSON object"));
        }
        Ok(Self { body })
    }

    /// The stock card shipped with the crate.
    pub fn bundled() -> Result<Self, RenderError> {
        Self::from_json(include_str!("../assets/stock.json"))
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Renders data records into platform attachments.
pub trait CardRenderer: Send + Sync {
    fn render(&self, template: &CardTemplate, data: &Value) -> Result<Attachment, RenderError>;

    fn render_preview(&self, title: &str, subtitle: &str) -> Attachment;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateCardRenderer;

impl CardRenderer for TemplateCardRenderer {
    fn render(&self, template: &CardTemplate, data: &Value) -> Result<Attachment, RenderError> {
        let data = data
            .as_object()
            .ok_or_else(|| RenderError::from("card data must be a JSON object"))?;
        let content = bind_value(template.body(), data)?;
        Ok(Attachment::new(ADAPTIVE_CARD_CONTENT_TYPE, content))
    }

    fn render_preview(&self, title: &str, subtitle: &str) -> Attachment {
        Attachment::new(
            HERO_CARD_CONTENT_TYPE,
            json!({ "title": title, "subtitle": subtitle }),
        )
    }
}

fn bind_value(node: &Value, data: &Map<String, Value>) -> Result<Value, RenderError> {
    match node {
        Value::String(text) => bind_string(text, data),
        Value::Array(items) => items
            .iter()
            .map(|item| bind_value(item, data))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(key.clone(), bind_value(value, data)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn bind_string(text: &str, data: &Map<String, Value>) -> Result<Value, RenderError> {
    // A string that is exactly one expression keeps the bound value's JSON type.
    if let Some(path) = whole_expression(text) {
        return lookup(data, path).cloned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| RenderError(format!("unterminated expression in {text:?}")))?;
        let value = lookup(data, after[..end].trim())?;
        out.push_str(&display(value));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

fn whole_expression(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Result<&'a Value, RenderError> {
    if path.is_empty() {
        return Err(RenderError::from("empty template expression"));
    }
    let mut segments = path.split('.');
    let first = segments.next().unwrap_or_default();
    let mut current = data
        .get(first)
        .ok_or_else(|| RenderError(format!("unbound template field: {path}")))?;
    for segment in segments {
        current = current
            .get(segment)
            .ok_or_else(|| RenderError(format!("unbound template field: {path}")))?;
    }
    Ok(current)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
