//! Functional tests for the upload endpoints

use axum::http::StatusCode;
use tower::ServiceExt;

use crate::helpers::{get, multipart_request, response_json, test_app, test_app_with, PNG_BYTES};

#[tokio::test]
async fn test_upload_accepts_png() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/upload",
            "image",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["file"]["originalName"], "photo.png");
    assert_eq!(body["file"]["mimetype"], "image/png");
    assert_eq!(body["file"]["size"], PNG_BYTES.len());

    // The returned identifier resolves immediately
    let image_id = body["imageId"].as_str().unwrap().to_string();
    let info = app
        .router
        .oneshot(get(&format!("/api/upload/{}", image_id)))
        .await
        .unwrap();
    assert_eq!(info.status(), StatusCode::OK);
    let info = response_json(info).await;
    assert_eq!(info["file"]["id"], image_id.as_str());
    assert_eq!(info["file"]["size"], PNG_BYTES.len());
}

#[tokio::test]
async fn test_upload_accepts_photo_field_name() {
    let app = test_app();

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/upload",
            "photo",
            "me.jpg",
            "image/jpeg",
            PNG_BYTES,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["file"]["filename"]
        .as_str()
        .unwrap()
        .ends_with(".jpg"));
}

#[tokio::test]
async fn test_upload_rejects_wrong_mime_type() {
    let app = test_app();

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/upload",
            "image",
            "notes.txt",
            "text/plain",
            b"definitely not an image",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid file type"));
}

#[tokio::test]
async fn test_upload_rejects_oversize_even_with_valid_mime() {
    let app = test_app_with(|s| s.storage.max_upload_bytes = 8, false, None);

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/upload",
            "image",
            "big.png",
            "image/png",
            PNG_BYTES,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("File too large"));
}

#[tokio::test]
async fn test_upload_without_image_field_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .oneshot(multipart_request(
            "/api/upload",
            "document",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_identifiers_are_unique() {
    let app = test_app();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(multipart_request(
                "/api/upload",
                "image",
                "photo.png",
                "image/png",
                PNG_BYTES,
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        ids.push(body["imageId"].as_str().unwrap().to_string());
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_file_info_unknown_id_is_not_found() {
    let app = test_app();

    let response = app
        .router
        .oneshot(get("/api/upload/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_delete_removes_the_file() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(
            "/api/upload",
            "image",
            "photo.png",
            "image/png",
            PNG_BYTES,
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let image_id = body["imageId"].as_str().unwrap().to_string();

    let delete = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(format!("/api/upload/{}", image_id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::OK);
    assert_eq!(response_json(delete).await["success"], true);

    let info = app
        .router
        .oneshot(get(&format!("/api/upload/{}", image_id)))
        .await
        .unwrap();
    assert_eq!(info.status(), StatusCode::NOT_FOUND);
}
