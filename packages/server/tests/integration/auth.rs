use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USERNAME, TestApp, routes};

#[tokio::test]
async fn login_returns_success_and_token() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["success"], true);
    assert!(!res.body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"username": ADMIN_USERNAME, "password": "nope"}),
        )
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "INVALID_CREDENTIALS");

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"username": "someone", "password": ADMIN_PASSWORD}),
        )
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_validates_body() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::LOGIN, &json!({"username": "  ", "password": "x"}))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let res = app
        .post_without_token(routes::LOGIN, &json!({"username": "admin"}))
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn writes_require_a_valid_token() {
    let app = TestApp::spawn().await;
    let body = json!({"courses": []});

    let res = app.put_without_token(&routes::section("courses"), &body).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");

    let res = app
        .put_with_token(&routes::section("courses"), &body, "garbage")
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_INVALID");

    let res = app
        .post_without_token(routes::COURSES, &json!({"code": "CS1", "title": "Intro"}))
        .await;
    assert_eq!(res.status, 401);

    let res = app.get_without_token(routes::FILES).await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn section_reads_are_public() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(&routes::section("research")).await;
    assert_eq!(res.status, 200);
}
