//! Mapping of HTTP failures onto the classified [`ApiError`].

use chrono::{DateTime, Utc};
use kitbridge_core::ApiError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};

/// Result type for SDK operations.
pub type KitResult<T> = Result<T, ApiError>;

/// Error body returned by the Kit API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Build a classified error from a non-success response.
pub fn from_response(status: u16, body: &str, retry_after_secs: Option<u64>) -> ApiError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) if !response.errors.is_empty() => response.errors.join("; "),
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => body.trim().to_string(),
    };
    ApiError::from_status(status, message, retry_after_secs)
}

/// Parse a `Retry-After` header given either as delay seconds or as an
/// HTTP date.
pub fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some((at.with_timezone(&Utc) - now).num_seconds().max(0) as u64)
}

/// Classify a transport-level failure.
pub fn from_reqwest(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        ApiError::Request(error.to_string())
    } else if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_errors_array_is_joined() {
        let error = from_response(422, r#"{"errors":["Email address is invalid","Name too long"]}"#, None);
        assert_eq!(
            error,
            ApiError::Validation("Email address is invalid; Name too long".to_string())
        );
    }

    #[test]
    fn test_plain_and_empty_bodies() {
        assert_eq!(
            from_response(404, "Not Found", None),
            ApiError::NotFound("Not Found".to_string())
        );
        assert_eq!(
            from_response(502, "", None),
            ApiError::Server {
                status: 502,
                message: "HTTP 502".to_string()
            }
        );
    }

    #[test]
    fn test_retry_after_formats() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers, now), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(retry_after(&headers, now), Some(12));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Sat, 01 Jun 2024 00:00:30 GMT"));
        assert_eq!(retry_after(&headers, now), Some(30));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers, now), None);
    }
}
