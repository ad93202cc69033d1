//! Functional tests for download, bundling, and sharing

use axum::http::{header, StatusCode};
use serde_json::json;
use std::io::{Cursor, Read};
use tower::ServiceExt;

use crate::helpers::{
    get, json_request, response_bytes, response_json, seed_upload, test_app, TestApp, PNG_BYTES,
};

/// Upload + generate, returning (session_id, thumbnail_ids)
async fn seed_session(app: &TestApp, count: u32) -> (String, Vec<String>) {
    let file_id = seed_upload(&app.state).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/generate",
            json!({
                "fileId": file_id,
                "videoType": "gaming",
                "style": "bold",
                "mood": "energetic",
                "photoPlacement": "center",
                "generateCount": count,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    let thumbnail_ids = body["thumbnails"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();

    (session_id, thumbnail_ids)
}

#[tokio::test]
async fn test_download_single_thumbnail_as_attachment() {
    let app = test_app();
    let (_, thumbnail_ids) = seed_session(&app, 1).await;

    let response = app
        .router
        .oneshot(get(&format!("/api/download/{}", thumbnail_ids[0])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&thumbnail_ids[0]));

    assert_eq!(response_bytes(response).await, PNG_BYTES);
}

#[tokio::test]
async fn test_download_unknown_thumbnail_is_not_found() {
    let app = test_app();

    let response = app
        .router
        .oneshot(get("/api/download/11111111-2222-3333-4444-555555555555"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Thumbnail not found");
}

#[tokio::test]
async fn test_download_all_bundles_thumbnails_and_manifest() {
    let app = test_app();
    let (session_id, thumbnail_ids) = seed_session(&app, 2).await;

    let response = app
        .router
        .oneshot(get(&format!("/api/download/all/{}", session_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );

    let bytes = response_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    for id in &thumbnail_ids {
        let name = format!("horizontal_{}.png", id);
        assert!(archive.by_name(&name).is_ok(), "missing entry {}", name);
    }

    let mut manifest = String::new();
    archive
        .by_name("session_info.json")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
    assert_eq!(manifest["sessionId"], session_id.as_str());
    assert_eq!(manifest["thumbnailCount"], 2);
    assert_eq!(manifest["thumbnails"].as_array().unwrap().len(), 2);

    // No archive artifact lingers in the blob directory
    let leftover = std::fs::read_dir(&app.state.settings.storage.upload_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().ends_with(".zip"));
    assert!(!leftover);
}

#[tokio::test]
async fn test_download_all_empty_session_is_not_found() {
    let app = test_app();
    let (session_id, _) = seed_session(&app, 1).await;

    // Rewrite the session with an empty thumbnail list
    let id = uuid::Uuid::parse_str(&session_id).unwrap();
    let mut session = app.state.sessions.load(id).await.unwrap();
    session.thumbnails.clear();
    app.state.sessions.save(&session).await.unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/api/download/all/{}", session_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "No thumbnails found in session");
}

#[tokio::test]
async fn test_download_all_unknown_session_is_not_found() {
    let app = test_app();

    let response = app
        .router
        .oneshot(get(
            "/api/download/all/11111111-2222-3333-4444-555555555555",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_thumbnail_info_includes_owning_session() {
    let app = test_app();
    let (session_id, thumbnail_ids) = seed_session(&app, 1).await;

    let response = app
        .router
        .oneshot(get(&format!("/api/download/info/{}", thumbnail_ids[0])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["thumbnail"]["id"], thumbnail_ids[0].as_str());
    assert!(body["thumbnail"]["size"].as_u64().unwrap() > 0);
    assert_eq!(
        body["thumbnail"]["sessionInfo"]["sessionId"],
        session_id.as_str()
    );
    assert!(body["thumbnail"]["sessionInfo"]["prompt"].is_string());
}

#[tokio::test]
async fn test_copy_url_is_absolute() {
    let app = test_app();
    let (_, thumbnail_ids) = seed_session(&app, 1).await;

    let request = axum::http::Request::builder()
        .uri(format!("/api/download/copy/{}", thumbnail_ids[0]))
        .header("host", "thumbs.example.test")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://thumbs.example.test/uploads/"));
    assert!(url.contains(&thumbnail_ids[0]));
}

#[tokio::test]
async fn test_share_mints_download_link_with_advisory_expiry() {
    let app = test_app();
    let (_, thumbnail_ids) = seed_session(&app, 1).await;

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            &format!("/api/download/share/{}", thumbnail_ids[0]),
            json!({ "shareType": "unlisted" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["shareType"], "unlisted");
    assert!(body["shareUrl"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/api/download/{}", thumbnail_ids[0])));

    let expires_at = chrono::DateTime::parse_from_rfc3339(body["expiresAt"].as_str().unwrap())
        .unwrap()
        .with_timezone(&chrono::Utc);
    let days = (expires_at - chrono::Utc::now()).num_days();
    assert!((6..=7).contains(&days));
}

#[tokio::test]
async fn test_share_defaults_to_public() {
    let app = test_app();
    let (_, thumbnail_ids) = seed_session(&app, 1).await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/api/download/share/{}", thumbnail_ids[0]))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["shareType"], "public");
}

#[tokio::test]
async fn test_share_unknown_thumbnail_is_not_found() {
    let app = test_app();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/download/share/11111111-2222-3333-4444-555555555555")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
