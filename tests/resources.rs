//! Plain resource CRUD against a real database. Set `TEST_DATABASE_URL` to run.

mod common;

use axum::http::StatusCode;
use college_cms::app;
use common::*;
use serde_json::json;
use tower::ServiceExt;

fn media_path(fx: &DbFixture, url: &str) -> std::path::PathBuf {
    fx.media_dir.path().join(url.trim_start_matches("http://localhost:5000/uploads/"))
}

#[tokio::test]
async fn crud_round_with_partial_update() {
    let Some(fx) = db_fixture().await else { return };
    let router = app(fx.state.clone());

    let resp = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/notices",
            json!({ "title": "Exam schedule", "noticeDate": "2025-03-01", "link": "https://x/y" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await["data"].clone();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["noticeDate"], json!("2025-03-01"));
    assert!(created["createdAt"].is_string());

    // Omitted columns keep their value.
    let resp = router
        .clone()
        .oneshot(json_request("PATCH", &format!("/api/notices/{}", id), json!({ "title": "Exam schedule (rev)" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await["data"].clone();
    assert_eq!(updated["title"], json!("Exam schedule (rev)"));
    assert_eq!(updated["link"], json!("https://x/y"));
    assert_eq!(updated["noticeDate"], json!("2025-03-01"));

    let resp = router.clone().oneshot(empty_request("GET", "/api/notices")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["meta"]["count"], json!(1));

    let resp = router
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/notices/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = router
        .oneshot(empty_request("GET", &format!("/api/notices/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    fx.drop_schema().await;
}

#[tokio::test]
async fn replacing_an_image_removes_the_old_object() {
    let Some(fx) = db_fixture().await else { return };
    let router = app(fx.state.clone());

    let req = multipart_request(
        "POST",
        "/api/events",
        &[
            Part::Text("title", "Annual Day"),
            Part::Text("eventDate", "2025-01-26"),
            Part::File {
                name: "file",
                file_name: "poster.png",
                content_type: "image/png",
                bytes: b"first",
            },
        ],
    );
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let row = body_json(resp).await["data"].clone();
    let id = row["id"].as_i64().unwrap();
    let first_url = row["imageUrl"].as_str().unwrap().to_string();
    assert!(media_path(&fx, &first_url).exists());

    // No file: image columns untouched.
    let req = multipart_request("PUT", &format!("/api/events/{}", id), &[Part::Text("title", "Annual Day 2025")]);
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(body_json(resp).await["data"]["imageUrl"], json!(first_url));

    let req = multipart_request(
        "PUT",
        &format!("/api/events/{}", id),
        &[Part::File {
            name: "file",
            file_name: "poster-v2.png",
            content_type: "image/png",
            bytes: b"second",
        }],
    );
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let second_url = body_json(resp).await["data"]["imageUrl"].as_str().unwrap().to_string();
    assert_ne!(second_url, first_url);
    assert!(!media_path(&fx, &first_url).exists());
    assert!(media_path(&fx, &second_url).exists());

    let resp = router
        .oneshot(empty_request("DELETE", &format!("/api/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!media_path(&fx, &second_url).exists());
    fx.drop_schema().await;
}

#[tokio::test]
async fn bulk_delete_isolates_items() {
    let Some(fx) = db_fixture().await else { return };
    let router = app(fx.state.clone());

    let mut ids = Vec::new();
    for title in ["a", "b"] {
        let resp = router
            .clone()
            .oneshot(json_request("POST", "/api/links", json!({ "title": title, "url": "https://x" })))
            .await
            .unwrap();
        ids.push(body_json(resp).await["data"]["id"].as_i64().unwrap());
    }

    let resp = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/links/bulk-delete",
            json!({ "ids": [ids[0], "nope", 987654, ids[1].to_string()] }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await["data"].clone();
    assert_eq!(data["deleted"], json!([ids[0], ids[1]]));
    assert_eq!(data["failed"].as_array().unwrap().len(), 2);

    let resp = router.oneshot(empty_request("GET", "/api/links")).await.unwrap();
    assert_eq!(body_json(resp).await["data"], json!([]));
    fx.drop_schema().await;
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let Some(fx) = db_fixture().await else { return };
    let resp = app(fx.state.clone())
        .oneshot(json_request("PUT", "/api/staff/31337", json!({ "name": "x" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    fx.drop_schema().await;
}
