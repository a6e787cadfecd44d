//! Errors raised while building, signing, encrypting or delivering a push message.

use std::fmt;
use std::time::{Duration, SystemTime};

use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WebPushError {
    #[error("an unknown error happened while encrypting or sending the message")]
    Unspecified,
    #[error("please provide valid credentials to send the notification: {0}")]
    Unauthorized(ErrorInfo),
    #[error("request was badly formed: {0}")]
    BadRequest(ErrorInfo),
    #[error("server was unable to process the request, please try again later: {info}")]
    ServerError {
        retry_after: Option<RetryAfter>,
        info: ErrorInfo,
    },
    #[error("push service is rate limiting requests, please try again later: {info}")]
    TooManyRequests {
        retry_after: Option<RetryAfter>,
        info: ErrorInfo,
    },
    #[error("the feature is not implemented yet")]
    NotImplemented(ErrorInfo),
    #[error("the provided URI is invalid")]
    InvalidUri,
    #[error("the URL specified is no longer valid and should no longer be used: {0}")]
    EndpointNotValid(ErrorInfo),
    #[error("the URL specified is invalid and should not be used again: {0}")]
    EndpointNotFound(ErrorInfo),
    #[error("maximum allowed payload size is 3052 bytes")]
    PayloadTooLarge,
    #[error("the push service rejected the payload as too large: {0}")]
    PayloadRejected(ErrorInfo),
    #[error("could not initialize a TLS connection")]
    TlsError,
    #[error("error in reading response body")]
    InvalidResponse,
    #[error("the push service returned an unexpected status: {0}")]
    Other(ErrorInfo),
    #[error("the request could not be built: {0}")]
    InvalidRequest(String),
    #[error("the request could not reach the push service: {0}")]
    Transport(String),
    #[error("the push service did not answer in time")]
    Timeout,
    #[error("could not parse the TTL value")]
    InvalidTtl,
    #[error("the topic is longer than 32 characters or not base64url")]
    InvalidTopic,
    #[error("the cryptographic keys of the subscription are invalid")]
    InvalidCryptoKeys,
    #[error("the VAPID private key is invalid")]
    InvalidSecretKey,
    #[error("the VAPID claims could not be serialized: {0}")]
    InvalidClaims(String),
    #[error("missing configuration value {0}")]
    MissingConfig(String),
    #[error("the VAPID subject must be a mailto: or https: URI, got {0:?}")]
    InvalidVapidSubject(String),
    #[error("the VAPID public key does not belong to the private key")]
    MismatchedVapidKeys,
}

impl WebPushError {
    pub fn short_description(&self) -> &'static str {
        match self {
            WebPushError::Unspecified => "unspecified",
            WebPushError::Unauthorized(_) => "unauthorized",
            WebPushError::BadRequest(_) => "bad_request",
            WebPushError::ServerError { .. } => "server_error",
            WebPushError::TooManyRequests { .. } => "too_many_requests",
            WebPushError::NotImplemented(_) => "not_implemented",
            WebPushError::InvalidUri => "invalid_uri",
            WebPushError::EndpointNotValid(_) => "endpoint_not_valid",
            WebPushError::EndpointNotFound(_) => "endpoint_not_found",
            WebPushError::PayloadTooLarge => "payload_too_large",
            WebPushError::PayloadRejected(_) => "payload_rejected",
            WebPushError::TlsError => "tls_error",
            WebPushError::InvalidResponse => "invalid_response",
            WebPushError::Other(_) => "other",
            WebPushError::InvalidRequest(_) => "invalid_request",
            WebPushError::Transport(_) => "transport",
            WebPushError::Timeout => "timeout",
            WebPushError::InvalidTtl => "invalid_ttl",
            WebPushError::InvalidTopic => "invalid_topic",
            WebPushError::InvalidCryptoKeys => "invalid_crypto_keys",
            WebPushError::InvalidSecretKey => "invalid_secret_key",
            WebPushError::InvalidClaims(_) => "invalid_claims",
            WebPushError::MissingConfig(_) => "missing_config",
            WebPushError::InvalidVapidSubject(_) => "invalid_vapid_subject",
            WebPushError::MismatchedVapidKeys => "mismatched_vapid_keys",
        }
    }

    /// The HTTP status the push service answered with, if the error came from a response.
    ///
    /// Local failures (encryption, signing, configuration) and network failures carry no
    /// status code.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            WebPushError::Unauthorized(info)
            | WebPushError::BadRequest(info)
            | WebPushError::NotImplemented(info)
            | WebPushError::EndpointNotValid(info)
            | WebPushError::EndpointNotFound(info)
            | WebPushError::PayloadRejected(info)
            | WebPushError::Other(info)
            | WebPushError::ServerError { info, .. }
            | WebPushError::TooManyRequests { info, .. } => Some(info.code),
            _ => None,
        }
    }

    /// Rate limiting (429), any server fault (5xx) and per-attempt timeouts are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            WebPushError::Timeout => true,
            _ => matches!(self.status_code(), Some(429) | Some(500..=599)),
        }
    }

    /// The subscription is unknown (404) or expired (410) and should be dropped by its owner.
    pub fn is_subscription_gone(&self) -> bool {
        matches!(self.status_code(), Some(404) | Some(410))
    }

    /// The `Retry-After` hint the push service sent along with a 429 or 5xx.
    pub fn retry_after(&self) -> Option<&RetryAfter> {
        match self {
            WebPushError::ServerError { retry_after, .. }
            | WebPushError::TooManyRequests { retry_after, .. } => retry_after.as_ref(),
            _ => None,
        }
    }
}

impl From<http::Error> for WebPushError {
    fn from(err: http::Error) -> Self {
        WebPushError::InvalidRequest(err.to_string())
    }
}

impl From<http::uri::InvalidUri> for WebPushError {
    fn from(_: http::uri::InvalidUri) -> Self {
        WebPushError::InvalidUri
    }
}

impl From<ece::Error> for WebPushError {
    fn from(_: ece::Error) -> Self {
        WebPushError::InvalidCryptoKeys
    }
}

impl From<serde_json::Error> for WebPushError {
    fn from(err: serde_json::Error) -> Self {
        WebPushError::InvalidClaims(err.to_string())
    }
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for WebPushError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebPushError::Timeout
        } else {
            WebPushError::Transport(err.to_string())
        }
    }
}

/// The error body push services send back, plus the status code it came with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u16,
    pub errno: u16,
    pub error: String,
    pub message: String,
}

impl ErrorInfo {
    /// Parses the JSON error body of a push service, falling back to the raw text.
    ///
    /// `code` is always the HTTP status; a `code` inside the body is ignored.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorInfo>(body) {
            Ok(info) => ErrorInfo {
                code: status.as_u16(),
                ..info
            },
            Err(_) => ErrorInfo {
                code: status.as_u16(),
                errno: 999,
                error: status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
                message: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (errno {}): {}",
            self.code, self.error, self.errno, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfter {
    Delay(Duration),
    DateTime(SystemTime),
}

impl RetryAfter {
    /// Parses a `Retry-After` header: either delta-seconds or an HTTP date.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(header_value: &str) -> Option<RetryAfter> {
        let value = header_value.trim();
        if let Ok(seconds) = value.parse::<u64>() {
            return Some(RetryAfter::Delay(Duration::from_secs(seconds)));
        }

        chrono::DateTime::parse_from_rfc2822(value)
            .map(|date_time| RetryAfter::DateTime(date_time.into()))
            .ok()
    }
}
