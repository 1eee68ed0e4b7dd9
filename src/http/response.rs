//! HTTP response building module
//!
//! Plain-text responses for routing misses and server-side failures.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};

use crate::render::TEXT_CONTENT_TYPE;

/// Build a `text/plain` response with the given status
pub fn build_text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}

/// Build 404 Not Found response naming the request target and method
pub fn build_404_response(target: &str, method: &Method) -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, format!("{target} {method} not found"))
}

/// Build 405 Method Not Allowed response naming the request target and method
pub fn build_405_response(target: &str, method: &Method) -> Response<Full<Bytes>> {
    build_text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("{target} {method} not allowed"),
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_404_body() {
        let response = build_404_response("/user/nope?x=1", &Method::GET);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_CONTENT_TYPE);
        assert_eq!(body_text(response).await, "/user/nope?x=1 GET not found");
    }

    #[tokio::test]
    async fn test_405_body() {
        let response = build_405_response("/user/info", &Method::DELETE);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "/user/info DELETE not allowed");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(build_413_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(build_500_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
