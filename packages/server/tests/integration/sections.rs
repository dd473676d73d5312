use lab_server::entity::content_document;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{Value, json};

use crate::common::{TestApp, Upload, routes};

const ID_1: &str = "0190a000-0000-7000-8000-000000000001";
const ID_2: &str = "0190a000-0000-7000-8000-000000000002";

fn canonical_sections() -> Vec<(&'static str, Value)> {
    vec![
        (
            "research",
            json!({
                "publications": [{
                    "id": ID_1, "title": "Graphs", "author": "A. Author", "journal": "J. Graphs",
                    "year": 2020, "citedBy": "12", "link": "https://doi.example/1",
                    "images": ["1700000000000-fig.png"]
                }],
                "collaborations": [{
                    "id": ID_2, "name": "Lab X", "link": "https://x.example", "position": "PI",
                    "department": "CS", "departmentLink": "https://cs.example"
                }]
            }),
        ),
        (
            "team",
            json!({
                "Faculty": [{
                    "id": ID_1, "name": "Prof. A", "title": "Professor", "subtitle": "",
                    "linkedin": "", "github": "", "image": "1700000000001-a.png"
                }],
                "Alumni": []
            }),
        ),
        (
            "courses",
            json!({"courses": [{
                "id": ID_1, "code": "CS101", "title": "Intro", "description": "Basics", "link": ""
            }]}),
        ),
        (
            "openings",
            json!({
                "PhD Positions": [{"id": ID_1, "name": "Call 2025", "file": "1700000000-call.pdf"}],
                "Research Assistant": [],
                "B.Tech Projects": []
            }),
        ),
        (
            "phd",
            json!({"scholars": [{
                "id": ID_1, "name": "S. Scholar", "email": "s@lab.example", "image": "1700000000002-s.png",
                "education": ["B.Tech"], "researchAreas": ["Systems"], "interests": [],
                "publications": [{
                    "title": "Paper", "doi": "10.1/x", "citation": "", "note": "", "year": "2021",
                    "link": "", "description": ""
                }],
                "googleScholar": "", "linkedin": "", "github": ""
            }]}),
        ),
    ]
}

#[tokio::test]
async fn missing_sections_have_default_shape() {
    let app = TestApp::spawn().await;

    assert_eq!(
        app.section("research").await,
        json!({"publications": [], "collaborations": []})
    );
    assert_eq!(app.section("team").await, json!({}));
    assert_eq!(app.section("courses").await, json!({"courses": []}));
    assert_eq!(
        app.section("openings").await,
        json!({"PhD Positions": [], "Research Assistant": [], "B.Tech Projects": []})
    );
    assert_eq!(app.section("phd").await, json!({"scholars": []}));
}

#[tokio::test]
async fn replace_then_get_round_trips_every_section() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    for (name, value) in canonical_sections() {
        let res = app.put_with_token(&routes::section(name), &value, &token).await;
        assert_eq!(res.status, 200, "replace {name} failed: {}", res.text);
        assert_eq!(res.body, value, "replace {name} echoed a different value");

        assert_eq!(app.section(name).await, value, "round trip of {name}");
    }
}

#[tokio::test]
async fn replace_assigns_ids_to_items_without_one() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .put_with_token(
            &routes::section("courses"),
            &json!({"courses": [{"code": "CS1", "title": "A"}, {"code": "CS2", "title": "B"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let courses = app.section("courses").await["courses"].clone();
    let first = courses[0]["id"].as_str().unwrap().to_string();
    let second = courses[1]["id"].as_str().unwrap().to_string();
    assert_ne!(first, second);
    assert!(uuid::Uuid::parse_str(&first).is_ok());

    // Ids stay stable across reads.
    assert_eq!(app.section("courses").await["courses"][0]["id"], first.as_str());
}

#[tokio::test]
async fn replace_rejects_malformed_and_invalid_documents() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .put_with_token(&routes::section("courses"), &json!({"courses": "nope"}), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let res = app
        .put_with_token(
            &routes::section("openings"),
            &json!({"Postdoc": [{"name": "x", "file": "1-x.pdf"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .put_with_token(
            &routes::section("research"),
            &json!({"publications": [{"title": "", "author": "a", "journal": "j", "year": 2020}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);

    // Nothing was written.
    assert_eq!(app.section("courses").await, json!({"courses": []}));
}

#[tokio::test]
async fn unknown_section_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app.get_without_token(&routes::section("blog")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");

    let res = app
        .put_with_token(&routes::section("blog"), &json!({}), &token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn legacy_string_years_are_accepted() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .put_with_token(
            &routes::section("research"),
            &json!({"publications": [{"title": "T", "author": "A", "journal": "J", "year": "2019"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(app.section("research").await["publications"][0]["year"], 2019);
}

#[tokio::test]
async fn legacy_document_gets_stable_ids_for_index_edits() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let figure = app
        .upload_file(
            Upload::new("fig.png", "image/png", b"figure"),
            Some("images/publications"),
            &token,
        )
        .await
        .storage_key();

    content_document::ActiveModel {
        name: Set("research".into()),
        schema_version: Set(0),
        body: Set(json!({
            "publications": [
                {"title": "First", "author": "A", "journal": "J", "year": 2018, "images": [figure]},
                {"title": "Second", "author": "B", "journal": "J", "year": 2019}
            ]
        })),
        updated_at: Set(chrono::Utc::now()),
    }
    .insert(&app.db)
    .await
    .unwrap();

    let first_read = app.section("research").await;
    let second_read = app.section("research").await;
    assert_eq!(first_read, second_read, "ids must not change between reads");
    assert!(first_read["publications"][0]["id"].is_string());

    let res = app
        .patch_with_token(&routes::publication("1"), &json!({"citedBy": "4"}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Second");
    assert_eq!(res.body["id"], first_read["publications"][1]["id"]);

    let res = app.delete_with_token(&routes::publication("0"), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let publications = app.section("research").await["publications"].clone();
    assert_eq!(publications.as_array().unwrap().len(), 1);
    assert_eq!(publications[0]["title"], "Second");
    assert_eq!(publications[0]["citedBy"], "4");
    assert!(!app.file_exists(&figure).await);
}

#[tokio::test]
async fn repeated_ids_are_made_unique_on_replace() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let res = app
        .put_with_token(
            &routes::section("research"),
            &json!({"publications": [
                {"id": ID_1, "title": "A", "author": "X", "journal": "J", "year": 2020},
                {"id": ID_1, "title": "B", "author": "Y", "journal": "J", "year": 2021}
            ]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let publications = &res.body["publications"];
    assert_eq!(publications[0]["id"], ID_1);
    assert_ne!(publications[1]["id"], ID_1);

    let res = app
        .patch_with_token(&routes::publication("1"), &json!({"citedBy": "9"}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let publications = app.section("research").await["publications"].clone();
    assert_eq!(publications[0]["title"], "A");
    assert_eq!(publications[0]["citedBy"], "");
    assert_eq!(publications[1]["title"], "B");
    assert_eq!(publications[1]["citedBy"], "9");

    // Editing by the original id touches only the first.
    let res = app
        .patch_with_token(&routes::publication(ID_1), &json!({"citedBy": "1"}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "A");
    assert_eq!(app.section("research").await["publications"][1]["citedBy"], "9");
}
