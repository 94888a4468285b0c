//! Admin user management routes.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::Role;
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_list_and_search() {
    let app = TestApp::new();
    let admin_id = app.add_user("admin@example.com", Role::Admin);
    app.add_user("zed@corp.io", Role::User);
    app.add_user("amy@corp.io", Role::User);
    let admin = app.token_for(admin_id, Role::Admin);

    let all = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["totalElements"], 3);
    assert_eq!(all.body["content"][0]["email"], "admin@example.com");
    assert_eq!(all.body["content"][0]["role"], "ADMIN");
    assert!(all.body["content"][0]["createdAt"].is_string());
    assert!(all.body["content"][0].get("passwordHash").is_none());

    let filtered = app.get("/api/admin/users?q=CORP", Some(&admin)).await;
    assert_eq!(filtered.body["totalElements"], 2);

    let search = app.get("/api/users?q=corp", Some(&admin)).await;
    assert_eq!(
        search.body,
        json!([
            { "id": 3, "email": "amy@corp.io" },
            { "id": 2, "email": "zed@corp.io" },
        ])
    );

    let blank = app.get("/api/users", Some(&admin)).await;
    assert_eq!(blank.body, json!([]));
}

#[tokio::test]
async fn test_role_change() {
    let app = TestApp::new();
    let admin = app.token_for(1, Role::Admin);
    let user = app.add_user("user@example.com", Role::User);
    let path = format!("/api/admin/users/{user}/role");

    let promoted = app.patch(&path, Some(&admin), &json!({ "role": "ADMIN" })).await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "ADMIN");

    let unknown = app.patch(&path, Some(&admin), &json!({ "role": "ROOT" })).await;
    assert_api_error(&unknown, StatusCode::BAD_REQUEST, "Unknown role: ROOT", &path);

    let missing = app
        .patch("/api/admin/users/999/role", Some(&admin), &json!({ "role": "USER" }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_rules() {
    let app = TestApp::new();
    let admin_id = app.add_user("admin@example.com", Role::Admin);
    let busy = app.add_user("busy@example.com", Role::User);
    let idle = app.add_user("idle@example.com", Role::User);
    app.add_task(Some(busy), "assigned");
    let admin = app.token_for(admin_id, Role::Admin);

    let own = format!("/api/admin/users/{admin_id}");
    let self_delete = app.delete(&own, Some(&admin)).await;
    assert_api_error(&self_delete, StatusCode::BAD_REQUEST, "You can't delete yourself", &own);

    let busy_path = format!("/api/admin/users/{busy}");
    let conflict = app.delete(&busy_path, Some(&admin)).await;
    assert_api_error(&conflict, StatusCode::CONFLICT, "Data integrity violation", &busy_path);

    let missing = app.delete("/api/admin/users/999", Some(&admin)).await;
    assert_api_error(&missing, StatusCode::NOT_FOUND, "User not found", "/api/admin/users/999");

    let deleted = app.delete(&format!("/api/admin/users/{idle}"), Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let remaining = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(remaining.body["totalElements"], 2);
}

#[tokio::test]
async fn test_non_admin_rejected_by_routing_layer() {
    let app = TestApp::new();
    let user = app.token_for(9, Role::User);
    for path in ["/api/admin/users", "/api/users?q=a"] {
        let response = app.get(path, Some(&user)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["message"], "Access denied");
    }
    let delete = app.delete("/api/admin/users/9", Some(&user)).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
}
