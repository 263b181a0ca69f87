//! Error responses.
//!
//! Every failure is a plain-text body plus an `X-CFDE-Error` header carrying
//! the same message on one line, so the UI can show it without parsing.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};
use dashboard_common::DashboardError;

pub const ERROR_HEADER: &str = "x-cfde-error";

#[derive(Debug)]
pub struct ApiError(pub DashboardError);

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError(e)
    }
}

/// One-line, header-safe copy of a message.
pub fn header_text(message: &str) -> String {
    message
        .chars()
        .map(|c| match c {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.0.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "Request rejected");
        }

        let header_value = HeaderValue::from_str(&header_text(&message))
            .unwrap_or_else(|_| HeaderValue::from_static("error"));
        (
            status,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
                (HeaderName::from_static(ERROR_HEADER), header_value),
            ],
            message,
        )
            .into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_text_flattens_newlines() {
        assert_eq!(header_text("bad join\nat line 2\r\n"), "bad join at line 2  ");
        assert_eq!(header_text("café"), "caf?");
    }

    #[test]
    fn test_status_and_header() {
        let resp = ApiError(DashboardError::invalid("Illegal grouping requested")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get("X-CFDE-Error").unwrap(),
            "Illegal grouping requested"
        );
        let resp = ApiError(DashboardError::upstream(Some(409), "conflict\ndetail")).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.headers().get("x-cfde-error").unwrap(), "conflict detail");
    }
}
