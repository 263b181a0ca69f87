//! Credentials forwarded from the inbound request to the catalog.
//!
//! The catalog authorizes reads per user, so the dashboard passes the caller's
//! session through instead of holding credentials of its own.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardHeaders {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

impl ForwardHeaders {
    pub fn none() -> Self {
        Self::default()
    }

    /// Session for a fixed webauthn token (local development without a login).
    pub fn dev_token(token: &str) -> Self {
        Self {
            authorization: None,
            cookie: Some(format!("webauthn={}", token)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.authorization.is_none() && self.cookie.is_none()
    }

    /// Header name/value pairs to attach to an outgoing request.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::with_capacity(2);
        if let Some(auth) = self.authorization.as_deref() {
            out.push(("authorization", auth));
        }
        if let Some(cookie) = self.cookie.as_deref() {
            out.push(("cookie", cookie));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_token_becomes_webauthn_cookie() {
        let h = ForwardHeaders::dev_token("abc123");
        assert_eq!(h.pairs(), vec![("cookie", "webauthn=abc123")]);
        assert!(!h.is_empty());
    }

    #[test]
    fn test_empty_headers_produce_no_pairs() {
        assert!(ForwardHeaders::none().pairs().is_empty());
    }
}
