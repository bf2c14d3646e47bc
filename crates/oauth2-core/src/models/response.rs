use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{BearerToken, OAuth2Error};

/// Transport-neutral response envelope produced by the dispatchers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OAuthResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// A JSON document, a plain string, or `Null` for an empty body.
    pub body: Value,
}

impl OAuthResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Token responses must never be cached (RFC 6749 §5.1).
    pub fn no_store(self) -> Self {
        self.with_header("Cache-Control", "no-store")
            .with_header("Pragma", "no-cache")
    }

    fn json(status: u16, body: Value) -> Self {
        Self::new(status, body).with_header("Content-Type", "application/json")
    }

    pub fn bearer(token: &BearerToken) -> Self {
        // BearerToken only holds strings and integers, serialization cannot fail.
        let body = serde_json::to_value(token).unwrap_or(Value::Null);
        Self::json(200, body).no_store()
    }

    pub fn error(err: &OAuth2Error) -> Self {
        let body = serde_json::to_value(err).unwrap_or(Value::Null);
        Self::json(err.status_code(), body).no_store()
    }

    /// `200 {}`, as answered by the revocation endpoint.
    pub fn empty_ok() -> Self {
        Self::json(200, Value::Object(serde_json::Map::new())).no_store()
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(302, Value::Null)
            .with_header("Location", location)
            .no_store()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
