use reqwest::Method;
use serde_json::json;

use crate::common::{TestApp, Upload, routes};

fn scholar() -> serde_json::Value {
    json!({
        "name": "R. Scholar",
        "email": "r.scholar@example.org",
        "education": ["M.Tech, 2020"],
        "researchAreas": ["Graph learning"],
        "publications": [{"title": "On Graphs", "doi": "10.1000/graphs", "year": "2023"}]
    })
}

#[tokio::test]
async fn scholar_crud_by_id() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app.post_with_token(routes::PHD_SCHOLARS, &scholar(), &token).await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();
    assert_eq!(res.body["researchAreas"][0], "Graph learning");

    let res = app
        .patch_with_token(
            &routes::phd_scholar(&id),
            &json!({"interests": ["Compilers"], "github": "https://github.com/rs"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["interests"][0], "Compilers");
    assert_eq!(res.body["publications"][0]["title"], "On Graphs");

    let phd = app.section("phd").await;
    assert_eq!(phd["scholars"][0]["id"], id.as_str());
    assert_eq!(phd["scholars"][0]["github"], "https://github.com/rs");

    let res = app.delete_with_token(&routes::phd_scholar(&id), &token).await;
    assert_eq!(res.status, 204);
    assert!(app.section("phd").await["scholars"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let mut body = scholar();
    body["email"] = json!("no-at-sign");
    let res = app.post_with_token(routes::PHD_SCHOLARS, &body, &token).await;
    assert_eq!(res.status, 400);

    let id = app
        .post_with_token(routes::PHD_SCHOLARS, &scholar(), &token)
        .await
        .id();
    let res = app
        .patch_with_token(&routes::phd_scholar(&id), &json!({"email": "still-bad"}), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(
        app.section("phd").await["scholars"][0]["email"],
        "r.scholar@example.org"
    );
}

#[tokio::test]
async fn scholar_photo_replace_and_detach() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let created = app
        .send_item_form(
            Method::POST,
            routes::PHD_SCHOLARS,
            Some(&scholar()),
            vec![Upload::new("rs.png", "image/png", b"one")],
            &token,
        )
        .await;
    assert_eq!(created.status, 201, "{}", created.text);
    let id = created.id();
    let first = created.body["image"].as_str().unwrap().to_string();

    let listed = app
        .get_with_token(&format!("{}?folder=images/team", routes::FILES), &token)
        .await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let replaced = app
        .send_item_form(
            Method::PATCH,
            &routes::phd_scholar(&id),
            None,
            vec![Upload::new("rs2.png", "image/png", b"two")],
            &token,
        )
        .await;
    assert_eq!(replaced.status, 200, "{}", replaced.text);
    let second = replaced.body["image"].as_str().unwrap().to_string();
    assert!(!app.file_exists(&first).await);

    let res = app
        .delete_with_token(&routes::phd_scholar_attachment(&id, &second), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body.get("image").is_none());
    assert!(!app.file_exists(&second).await);

    let res = app
        .delete_with_token(&routes::phd_scholar_attachment(&id, &second), &token)
        .await;
    assert_eq!(res.status, 404);
}
