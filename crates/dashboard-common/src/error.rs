use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Unknown variable/grouping, identical groupings, negative cap, malformed id.
    #[error("{0}")]
    InvalidParameter(String),

    #[error("DERIVA catalogId {0} not found")]
    CatalogNotFound(String),

    #[error("DCC '{0}' not found")]
    DccNotFound(String),

    /// The catalog answered, but with an error status.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DashboardError::InvalidParameter(msg.into())
    }

    pub fn upstream(status: Option<u16>, msg: impl Into<String>) -> Self {
        DashboardError::Upstream { status, message: msg.into() }
    }

    /// HTTP status the error should surface with.
    pub fn status_code(&self) -> u16 {
        match self {
            DashboardError::InvalidParameter(_) => 400,
            DashboardError::CatalogNotFound(_) | DashboardError::DccNotFound(_) => 404,
            DashboardError::Upstream { status, .. } => match status {
                Some(s) if (400..600).contains(s) => *s,
                _ => 500,
            },
            DashboardError::Http(e) => match e.status() {
                Some(s) if s.is_client_error() || s.is_server_error() => s.as_u16(),
                Some(_) => 500,
                None => 502,
            },
            DashboardError::Serialization(_) | DashboardError::Config(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_errors_are_client_errors() {
        let err = DashboardError::invalid("grouping1 and grouping2 cannot be the same dimension.");
        assert_eq!(err.status_code(), 400);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_scope_errors_map_to_not_found() {
        assert_eq!(DashboardError::CatalogNotFound("99".into()).status_code(), 404);
        let err = DashboardError::DccNotFound("cfde_registry_dcc:nope".into());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "DCC 'cfde_registry_dcc:nope' not found");
    }

    #[test]
    fn test_upstream_status_passthrough() {
        assert_eq!(DashboardError::upstream(Some(409), "conflict").status_code(), 409);
        assert_eq!(DashboardError::upstream(Some(200), "odd").status_code(), 500);
        assert_eq!(DashboardError::upstream(None, "boom").status_code(), 500);
    }
}
