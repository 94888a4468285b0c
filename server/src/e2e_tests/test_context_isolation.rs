//! The principal attached to one request is never visible to another.

use axum::http::{Method, StatusCode};
use futures::future::join_all;

use crate::auth::Role;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_anonymous_after_authenticated() {
    let app = TestApp::new();
    let task = app.add_task(Some(42), "mine");
    let path = format!("/api/tasks/{task}");

    let first = app.get(&path, Some(&app.token_for(42, Role::User))).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.get(&path, None).await;
    assert_api_error(&second, StatusCode::UNAUTHORIZED, "Unauthorized", &path);
}

#[tokio::test]
async fn test_anonymous_after_failed_authenticated_request() {
    let app = TestApp::new();
    let token = app.token_for(42, Role::User);

    let failed = app.get("/api/tasks/999", Some(&token)).await;
    assert_eq!(failed.status, StatusCode::NOT_FOUND);

    let anonymous = app.get("/api/tasks", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_see_only_their_own_principal() {
    let app = TestApp::new();
    let users: Vec<i64> = (100..132).collect();
    let tasks: Vec<i64> = users
        .iter()
        .map(|uid| app.add_task(Some(*uid), &format!("task of {uid}")))
        .collect();

    // Every caller asks for its own task and for its neighbour's.
    let requests = users.iter().enumerate().flat_map(|(i, uid)| {
        let token = app.token_for(*uid, Role::User);
        let own = tasks[i];
        let neighbour = tasks[(i + 1) % tasks.len()];
        [
            (own, StatusCode::OK, token.clone()),
            (neighbour, StatusCode::FORBIDDEN, token),
        ]
    });
    let anonymous = tasks
        .iter()
        .map(|task| (*task, StatusCode::UNAUTHORIZED, String::new()));

    let checks = requests.chain(anonymous).map(|(task, expected, token)| {
        let app = &app;
        async move {
            let token = (!token.is_empty()).then_some(token);
            let req = request(
                Method::GET,
                &format!("/api/tasks/{task}"),
                token.as_deref(),
                None,
            );
            (expected, app.send(req).await.status)
        }
    });

    for (expected, actual) in join_all(checks).await {
        assert_eq!(actual, expected);
    }
}
