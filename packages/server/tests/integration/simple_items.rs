//! Collaborations and courses: items with no attachments.

use reqwest::Method;
use serde_json::json;

use crate::common::{TestApp, Upload, routes};

#[tokio::test]
async fn collaboration_crud() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .post_with_token(
            routes::COLLABORATIONS,
            &json!({"name": "Lab X", "link": "https://x.example", "department": "CS"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();

    let res = app
        .patch_with_token(
            &routes::collaboration(&id),
            &json!({"departmentLink": "https://cs.x.example", "department": null}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["departmentLink"], "https://cs.x.example");
    assert_eq!(res.body["department"], "");
    assert_eq!(res.body["name"], "Lab X");

    let research = app.section("research").await;
    assert_eq!(research["collaborations"][0]["departmentLink"], "https://cs.x.example");

    let res = app.delete_with_token(&routes::collaboration(&id), &token).await;
    assert_eq!(res.status, 204);
    let res = app.delete_with_token(&routes::collaboration(&id), &token).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn collaborations_append_and_publications_stay_separate() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    for name in ["First", "Second"] {
        app.post_with_token(routes::COLLABORATIONS, &json!({"name": name}), &token)
            .await;
    }

    let research = app.section("research").await;
    assert_eq!(research["collaborations"][0]["name"], "First");
    assert_eq!(research["collaborations"][1]["name"], "Second");
    assert!(research["publications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn course_crud_and_validation() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .post_with_token(routes::COURSES, &json!({"code": "CS101"}), &token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .post_with_token(
            routes::COURSES,
            &json!({"code": "CS101", "title": "Intro", "description": "Basics"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let id = res.id();

    let res = app
        .patch_with_token(&routes::course(&id), &json!({"title": "Introduction"}), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["title"], "Introduction");
    assert_eq!(res.body["description"], "Basics");

    let res = app
        .patch_with_token(&routes::course(&id), &json!({"code": "  "}), &token)
        .await;
    assert_eq!(res.status, 400);

    let courses = app.section("courses").await;
    assert_eq!(courses["courses"][0]["code"], "CS101");
    assert_eq!(courses["courses"][0]["title"], "Introduction");
}

#[tokio::test]
async fn files_are_refused_for_items_without_attachments() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .send_item_form(
            Method::POST,
            routes::COURSES,
            Some(&json!({"code": "CS101", "title": "Intro"})),
            vec![Upload::new("syllabus.pdf", "application/pdf", b"%PDF")],
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert!(app.section("courses").await["courses"].as_array().unwrap().is_empty());

    let listed = app.get_with_token(routes::FILES, &token).await;
    assert!(listed.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn multipart_without_files_works_like_json() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .send_item_form(
            Method::POST,
            routes::COLLABORATIONS,
            Some(&json!({"name": "Lab Y"})),
            vec![],
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["name"], "Lab Y");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let missing = "0190a000-0000-7000-8000-00000000beef";

    let res = app
        .patch_with_token(&routes::course(missing), &json!({"title": "x"}), &token)
        .await;
    assert_eq!(res.status, 404);

    let res = app.delete_with_token(&routes::collaboration(missing), &token).await;
    assert_eq!(res.status, 404);
}
