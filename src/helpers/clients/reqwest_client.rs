use std::time::Duration;

use async_trait::async_trait;

use http::header::RETRY_AFTER;
use http::{Request, StatusCode};
use reqwest::Client;

use crate::helpers::clients::{request_builder, WebPushClient};
use crate::helpers::error::{RetryAfter, WebPushError};
use crate::helpers::message::WebPushMessage;

/// An async client for sending the notification payload.
///
/// This client is thread-safe. Clones of this client will share the same underlying resources,
/// so cloning is a cheap and effective method to provide access to the client.
///
/// This client is [`reqwest`](https://crates.io/crates/reqwest) based with rustls, and will only work in Tokio contexts.
#[derive(Clone)]
pub struct ReqwestWebPushClient {
    client: Client,
}

impl From<Client> for ReqwestWebPushClient {
    /// Creates a new client from a custom reqwest HTTP client.
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl ReqwestWebPushClient {
    /// Creates a new client. Requests never time out.
    pub fn new() -> Result<Self, WebPushError> {
        let client = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|_| WebPushError::TlsError)?;
        Ok(Self { client })
    }

    /// Creates a client whose requests fail with [`WebPushError::Timeout`] after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, WebPushError> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|_| WebPushError::TlsError)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebPushClient for ReqwestWebPushClient {
    async fn send(&self, message: WebPushMessage) -> Result<(), WebPushError> {
        trace!("Message: {:?}", message);

        let request: Request<Vec<u8>> = request_builder::build_request(message)?;
        debug!("Request: {:?}", request);

        let mut builder = self.client.post(request.uri().to_string());
        for (key, value) in request.headers() {
            builder = builder.header(key, value);
        }

        let response = builder.body(request.into_body()).send().await?;

        trace!("Response: {:?}", response);

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|ra| ra.to_str().ok())
            .and_then(RetryAfter::from_str);

        let response_status = response.status();
        trace!("Response status: {}", response_status);

        let body = read_body(response.bytes().await);
        trace!("Body text: {:?}", std::str::from_utf8(&body));

        let response = finish_response(response_status, retry_after, body);

        debug!("Response: {:?}", response);

        response
    }
}

/// A body that cannot be read must not hide the status already received.
fn read_body<B: AsRef<[u8]>, E: std::fmt::Display>(body: Result<B, E>) -> Vec<u8> {
    match body {
        Ok(bytes) => bytes.as_ref().to_vec(),
        Err(err) => {
            debug!("Could not read response body: {}", err);
            Vec::new()
        }
    }
}

/// Classifies the response and attaches the `Retry-After` hint to 429 and 5xx errors.
fn finish_response(
    response_status: StatusCode,
    retry_after: Option<RetryAfter>,
    body: Vec<u8>,
) -> Result<(), WebPushError> {
    match request_builder::parse_response(response_status, body) {
        Err(WebPushError::ServerError { info, .. }) => {
            Err(WebPushError::ServerError { retry_after, info })
        }
        Err(WebPushError::TooManyRequests { info, .. }) => {
            Err(WebPushError::TooManyRequests { retry_after, info })
        }
        other => other,
    }
}
