use std::sync::Arc;

use http::StatusCode;

/// [`Error`] behind an [`Arc`], so a single failed exchange can be handed to every caller
/// waiting on it.
pub type SharedError = Arc<Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("'{provider}' token exchange returned no access token")]
    NoToken { provider: &'static str },
    #[error(transparent)]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

/// A non-success response from a token endpoint.
#[derive(Debug)]
pub struct ResponseError {
    uri: Box<str>,
    status: StatusCode,
    content: ResponseErrorKind,
}

#[derive(Debug)]
enum ResponseErrorKind {
    Json(serde_json::Value),
    Text(Box<str>),
    Empty,
}

impl ResponseError {
    pub fn from_parts(uri: impl Into<Box<str>>, status: StatusCode, content: &str) -> Self {
        let trimmed = content.trim_start();

        let content = if trimmed.is_empty() {
            ResponseErrorKind::Empty
        } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
            match serde_json::from_str(trimmed) {
                Ok(json) => ResponseErrorKind::Json(json),
                // dont error out if the json is invalid, just fall back to raw text
                // that way we don't lose an error message
                Err(_) => ResponseErrorKind::Text(content.into()),
            }
        } else {
            ResponseErrorKind::Text(content.into())
        };

        Self {
            uri: uri.into(),
            status,
            content,
        }
    }

    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        debug_assert!(
            !response.status().is_success(),
            "shouldn't be called on responses with a successful code"
        );

        let uri = response.url().as_str().to_owned();
        let status = response.status();

        let text = match response.text().await {
            Ok(text) => text,
            Err(error) => {
                warn!(message = "failed to read token error body", ?error);
                String::new()
            }
        };

        Self::from_parts(uri, status, &text)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn try_extract_json_error_string(json: &serde_json::Value) -> Option<&str> {
    fn get_map_string<'a>(
        map: &'a serde_json::Map<String, serde_json::Value>,
        key: &str,
    ) -> Option<&'a str> {
        match map.get(key)? {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }
    }

    match json {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(values) => values.iter().find_map(try_extract_json_error_string),
        serde_json::Value::Object(map) => {
            // oauth endpoints use 'error_description', most google apis use 'message'
            if let Some(message) = get_map_string(map, "error_description") {
                return Some(message);
            }

            if let Some(message) = get_map_string(map, "message") {
                return Some(message);
            }

            match map.get("error")? {
                serde_json::Value::String(s) => Some(s),
                nested => try_extract_json_error_string(nested),
            }
        }
        _ => None,
    }
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.uri, self.status)?;

        match self.content {
            ResponseErrorKind::Json(ref json) => match try_extract_json_error_string(json) {
                Some(message) => write!(f, ": {message}"),
                None => Ok(()),
            },
            ResponseErrorKind::Text(ref text) => write!(f, ": {text}"),
            ResponseErrorKind::Empty => Ok(()),
        }
    }
}

impl std::error::Error for ResponseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_display() {
        let error = ResponseError::from_parts(
            "https://oauth2.googleapis.com/token",
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#,
        );

        assert_eq!(
            error.to_string(),
            "https://oauth2.googleapis.com/token - 400 Bad Request: Invalid JWT Signature."
        );
    }

    #[test]
    fn test_text_and_empty_error_display() {
        let text = ResponseError::from_parts("http://x/token", StatusCode::BAD_GATEWAY, "oops");
        assert_eq!(text.to_string(), "http://x/token - 502 Bad Gateway: oops");

        let empty = ResponseError::from_parts("http://x/token", StatusCode::UNAUTHORIZED, "");
        assert_eq!(empty.to_string(), "http://x/token - 401 Unauthorized");
    }

    #[test]
    fn test_invalid_json_falls_back_to_text() {
        let error = ResponseError::from_parts("http://x/token", StatusCode::BAD_REQUEST, "{nope");
        assert_eq!(error.to_string(), "http://x/token - 400 Bad Request: {nope");
    }
}
