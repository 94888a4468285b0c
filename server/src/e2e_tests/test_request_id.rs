//! Test that request IDs are echoed in responses.

use axum::http::{Method, StatusCode, header::HeaderValue};
use uuid::Uuid;

use crate::auth::middleware::REQUEST_ID_HEADER;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_request_id_preserved() {
    let app = TestApp::new();

    for request_id in ["abc-123", "  padded  ", "00000000-0000-0000-0000-000000000000"] {
        let mut req = request(Method::GET, "/health", None, None);
        req.headers_mut()
            .insert(&REQUEST_ID_HEADER, HeaderValue::from_static(request_id));

        let resp = app.send(req).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            resp.headers.get(&REQUEST_ID_HEADER).expect("header"),
            request_id.trim()
        );
    }
}

#[tokio::test]
async fn test_request_id_generated() {
    let app = TestApp::new();

    for req in [
        request(Method::GET, "/health", None, None),
        request(Method::GET, "/api/tasks", None, None),
    ] {
        let resp = app.send(req).await;
        let id = resp
            .headers
            .get(&REQUEST_ID_HEADER)
            .expect("header")
            .to_str()
            .expect("ascii");
        assert!(Uuid::parse_str(id).is_ok(), "{id}");
    }
}

#[tokio::test]
async fn test_blank_request_id_replaced() {
    let app = TestApp::new();
    let mut req = request(Method::GET, "/health", None, None);
    req.headers_mut()
        .insert(&REQUEST_ID_HEADER, HeaderValue::from_static("   "));

    let resp = app.send(req).await;
    let id = resp.headers.get(&REQUEST_ID_HEADER).expect("header");
    assert!(Uuid::parse_str(id.to_str().expect("ascii")).is_ok());
}
