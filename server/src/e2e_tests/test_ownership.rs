//! Ownership enforcement on a single task lookup.

use axum::http::StatusCode;

use crate::auth::Role;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_owner_other_user_and_admin() {
    let app = TestApp::new();
    let owned_by_43 = app.add_task(Some(43), "someone else's");
    let owned_by_42 = app.add_task(Some(42), "mine");

    let user_42 = app.token_for(42, Role::User);
    let admin_42 = app.token_for(42, Role::Admin);

    let denied = app
        .get(&format!("/api/tasks/{owned_by_43}"), Some(&user_42))
        .await;
    assert_api_error(
        &denied,
        StatusCode::FORBIDDEN,
        "Not your resource",
        &format!("/api/tasks/{owned_by_43}"),
    );

    let allowed = app
        .get(&format!("/api/tasks/{owned_by_42}"), Some(&user_42))
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["id"], owned_by_42);
    assert_eq!(allowed.body["assigneeId"], 42);

    let as_admin = app
        .get(&format!("/api/tasks/{owned_by_43}"), Some(&admin_42))
        .await;
    assert_eq!(as_admin.status, StatusCode::OK);
    assert_eq!(as_admin.body["assigneeId"], 43);
}

#[tokio::test]
async fn test_unassigned_task() {
    let app = TestApp::new();
    let task = app.add_task(None, "nobody's");
    let path = format!("/api/tasks/{task}");

    let as_user = app.get(&path, Some(&app.token_for(7, Role::User))).await;
    assert_api_error(&as_user, StatusCode::FORBIDDEN, "Resource is not assigned", &path);

    let as_admin = app.get(&path, Some(&app.token_for(1, Role::Admin))).await;
    assert_eq!(as_admin.status, StatusCode::OK);
    assert!(as_admin.body["assigneeId"].is_null());
}

#[tokio::test]
async fn test_missing_task_is_404_for_everyone() {
    let app = TestApp::new();
    for token in [app.token_for(7, Role::User), app.token_for(1, Role::Admin)] {
        let response = app.get("/api/tasks/12345", Some(&token)).await;
        assert_api_error(&response, StatusCode::NOT_FOUND, "Task not found", "/api/tasks/12345");
    }
}

#[tokio::test]
async fn test_status_change_requires_ownership() {
    let app = TestApp::new();
    let task = app.add_task(Some(42), "mine");
    let path = format!("/api/tasks/{task}/status");
    let body = serde_json::json!({ "status": "DONE" });

    let other = app.patch(&path, Some(&app.token_for(43, Role::User)), &body).await;
    assert_api_error(&other, StatusCode::FORBIDDEN, "Not your resource", &path);

    let owner = app.patch(&path, Some(&app.token_for(42, Role::User)), &body).await;
    assert_eq!(owner.status, StatusCode::OK);
    assert_eq!(owner.body["status"], "DONE");
}
