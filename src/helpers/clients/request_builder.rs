//! Functions used to send and consume push http messages.
//! This module can be used to build custom clients.

use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Request, StatusCode};

use crate::helpers::error::{ErrorInfo, WebPushError};
use crate::helpers::message::WebPushMessage;

/// Builds the request to send to the push service.
///
/// This function is generic over the request body, this means that you can swap out client implementations
/// even if they use different body types.
pub fn build_request<T>(message: WebPushMessage) -> Result<Request<T>, WebPushError>
where
    T: From<Vec<u8>> + From<&'static str>,
{
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(message.endpoint)
        .header("TTL", format!("{}", message.ttl).as_bytes());

    if let Some(urgency) = message.urgency {
        builder = builder.header("Urgency", urgency.to_string());
    }

    if let Some(topic) = message.topic {
        builder = builder.header("Topic", topic);
    }

    let request = if let Some(payload) = message.payload {
        builder = builder
            .header(CONTENT_ENCODING, payload.content_encoding.to_str())
            .header(CONTENT_LENGTH, format!("{}", payload.content.len() as u64).as_bytes())
            .header(CONTENT_TYPE, "application/octet-stream");

        for (k, v) in payload.crypto_headers.into_iter() {
            let v: &str = v.as_ref();
            builder = builder.header(k, v);
        }

        builder.body(payload.content.into())?
    } else {
        builder.header(CONTENT_LENGTH, "0").body("".into())?
    };

    Ok(request)
}

/// Parses the response from the push service, and will return `Err` if the request was bad.
///
/// Every error built from a response keeps the status code in its [`ErrorInfo`].
pub fn parse_response(response_status: StatusCode, body: Vec<u8>) -> Result<(), WebPushError> {
    if response_status.is_success() {
        return Ok(());
    }

    let info = ErrorInfo::from_response(response_status, &body);

    match response_status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WebPushError::Unauthorized(info)),
        StatusCode::GONE => Err(WebPushError::EndpointNotValid(info)),
        StatusCode::NOT_FOUND => Err(WebPushError::EndpointNotFound(info)),
        StatusCode::PAYLOAD_TOO_LARGE => Err(WebPushError::PayloadRejected(info)),
        StatusCode::BAD_REQUEST => Err(WebPushError::BadRequest(info)),
        StatusCode::TOO_MANY_REQUESTS => Err(WebPushError::TooManyRequests {
            retry_after: None,
            info,
        }),
        StatusCode::NOT_IMPLEMENTED => Err(WebPushError::NotImplemented(info)),
        status if status.is_server_error() => Err(WebPushError::ServerError {
            retry_after: None,
            info,
        }),
        _ => Err(WebPushError::Other(info)),
    }
}

#[cfg(test)]
mod tests {
    use http::header::{AUTHORIZATION, CONTENT_LENGTH};
    use http::StatusCode;
    use regex::Regex;

    use crate::helpers::clients::request_builder::*;
    use crate::helpers::error::WebPushError;
    use crate::helpers::http_ece::ContentEncoding;
    use crate::helpers::message::{SubscriptionInfo, Urgency, WebPushMessageBuilder};
    use crate::helpers::vapid::VapidSignature;

    fn subscription() -> SubscriptionInfo {
        SubscriptionInfo::new(
            "http://google.com",
            "BLMbF9ffKBiWQLCKvTHb6LO8Nb6dcUh6TItC455vu2kElga6PQvUmaFyCdykxY2nOSSL3yKgfbmFLRTUaGv4yV8",
            "xS03Fi5ErfTNH_l9WHE9Ig",
        )
    }

    #[test]
    fn builds_a_correct_request_with_empty_payload() {
        let info = subscription();
        let mut builder = WebPushMessageBuilder::new(&info);

        builder.set_ttl(420);
        builder.set_urgency(Urgency::VeryLow);
        builder.set_topic("some-topic".into());

        let request = build_request::<Vec<u8>>(builder.build().unwrap()).unwrap();
        let ttl = request.headers().get("TTL").unwrap().to_str().unwrap();
        let urgency = request.headers().get("Urgency").unwrap().to_str().unwrap();
        let topic = request.headers().get("Topic").unwrap().to_str().unwrap();
        let expected_uri: http::Uri = "http://google.com".parse().unwrap();

        assert_eq!("420", ttl);
        assert_eq!("very-low", urgency);
        assert_eq!("some-topic", topic);
        assert_eq!(expected_uri.host(), request.uri().host());
        assert_eq!(request.method(), http::Method::POST);
        assert_eq!(request.headers().get(CONTENT_LENGTH).unwrap(), "0");
        assert!(request.body().is_empty());
    }

    #[test]
    fn builds_a_correct_request_with_payload() {
        let info = subscription();
        let mut builder = WebPushMessageBuilder::new(&info);

        builder.set_payload(ContentEncoding::Aes128Gcm, "test".as_bytes());
        builder.set_vapid_signature(VapidSignature {
            auth_t: "header.claims.signature".to_string(),
            auth_k: vec![4, 1, 2, 3],
        });

        let request = build_request::<Vec<u8>>(builder.build().unwrap()).unwrap();
        let encoding = request
            .headers()
            .get("Content-Encoding")
            .unwrap()
            .to_str()
            .unwrap();
        let length = request.headers().get(CONTENT_LENGTH).unwrap();

        assert_eq!("aes128gcm", encoding);
        assert_eq!(length.to_str().unwrap(), request.body().len().to_string());
        assert_eq!(
            request.headers().get("Content-Type").unwrap(),
            "application/octet-stream"
        );
        assert!(request.headers().get("Urgency").is_none());

        let auth_re = Regex::new(r"^vapid t=header\.claims\.signature, k=[A-Za-z0-9_-]+$").unwrap();
        let authorization = request.headers().get(AUTHORIZATION).unwrap();
        assert!(auth_re.is_match(authorization.to_str().unwrap()));
    }

    #[test]
    fn parses_a_successful_response_correctly() {
        assert_eq!(Ok(()), parse_response(StatusCode::OK, vec![]));
        assert_eq!(Ok(()), parse_response(StatusCode::CREATED, vec![]));
    }

    #[test]
    fn parses_an_unauthorized_response_correctly() {
        let error = parse_response(StatusCode::UNAUTHORIZED, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::Unauthorized(_)));
        assert_eq!(error.status_code(), Some(401));

        let error = parse_response(StatusCode::FORBIDDEN, vec![]).unwrap_err();
        assert_eq!(error.status_code(), Some(403));
    }

    #[test]
    fn parses_a_gone_response_correctly() {
        let body = br#"{"code": 410, "errno": 106, "error": "Gone", "message": "Subscription has expired"}"#;
        let error = parse_response(StatusCode::GONE, body.to_vec()).unwrap_err();
        match &error {
            WebPushError::EndpointNotValid(info) => {
                assert_eq!(info.errno, 106);
                assert_eq!(info.message, "Subscription has expired");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(error.is_subscription_gone());
    }

    #[test]
    fn parses_a_not_found_response_correctly() {
        let error = parse_response(StatusCode::NOT_FOUND, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::EndpointNotFound(_)));
    }

    #[test]
    fn parses_a_payload_too_large_response_correctly() {
        let error = parse_response(StatusCode::PAYLOAD_TOO_LARGE, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::PayloadRejected(_)));
        assert_eq!(error.status_code(), Some(413));
        assert!(!error.is_transient());
    }

    #[test]
    fn parses_a_rate_limited_response_correctly() {
        let error = parse_response(StatusCode::TOO_MANY_REQUESTS, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::TooManyRequests { .. }));
        assert!(error.is_transient());
    }

    #[test]
    fn parses_a_server_error_response_correctly() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let error = parse_response(status, b"down".to_vec()).unwrap_err();
            assert!(matches!(error, WebPushError::ServerError { .. }));
            assert_eq!(error.status_code(), Some(status.as_u16()));
            assert!(error.is_transient());
        }
    }

    #[test]
    fn server_error_status_wins_over_body_code() {
        let body = br#"{"code": 400, "errno": 201, "error": "Bad Request", "message": "try later"}"#;
        let error = parse_response(StatusCode::SERVICE_UNAVAILABLE, body.to_vec()).unwrap_err();
        match &error {
            WebPushError::ServerError { info, .. } => {
                assert_eq!(info.code, 503);
                assert_eq!(info.errno, 201);
                assert_eq!(info.message, "try later");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(error.status_code(), Some(503));
        assert!(error.is_transient());
    }

    #[test]
    fn parses_a_bad_request_response_with_no_body_correctly() {
        let error = parse_response(StatusCode::BAD_REQUEST, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::BadRequest(_)));
        assert!(!error.is_transient());
    }

    #[test]
    fn parses_an_unexpected_status_as_other() {
        let error = parse_response(StatusCode::IM_A_TEAPOT, vec![]).unwrap_err();
        assert!(matches!(error, WebPushError::Other(_)));
        assert_eq!(error.status_code(), Some(418));
    }
}
