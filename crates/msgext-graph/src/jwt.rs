use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GraphError;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Reads the `exp` claim of an SSO token. The signature is not checked here.
pub fn expiration(token: &str) -> Result<DateTime<Utc>, GraphError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(GraphError::SsoToken("expected three segments".into())),
    };
    // Some issuers pad the segments.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| GraphError::SsoToken(format!("payload is not base64url: {e}")))?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes)
        .map_err(|e| GraphError::SsoToken(format!("payload missing exp: {e}")))?;
    DateTime::<Utc>::from_timestamp(claim.exp, 0)
        .ok_or_else(|| GraphError::SsoToken(format!("exp out of range: {}", claim.exp)))
}
