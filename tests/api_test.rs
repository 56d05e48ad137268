//! API integration tests.
//!
//! Tests HTTP API endpoints against a [`TestHarness`] server running on a
//! random port with in-memory content and metadata stores.

mod common;

use common::{jpeg, png, TestHarness};
use photostore::store::MetadataStore;
use photostore_common::{ContentKey, PhotoId};
use photostore_db::models::{Photo, PhotoWithThumbnails};
use reqwest::multipart::{Form, Part};

fn upload_form(bytes: Vec<u8>, mime: &str) -> Form {
    Form::new().part(
        "photo",
        Part::bytes(bytes)
            .file_name("upload")
            .mime_str(mime)
            .unwrap(),
    )
}

async fn upload(addr: std::net::SocketAddr, bytes: Vec<u8>, mime: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/photos"))
        .multipart(upload_form(bytes, mime))
        .send()
        .await
        .expect("request failed")
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_200() {
    let (_harness, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_returns_created_records() {
    let (harness, addr) = TestHarness::with_server().await;
    let bytes = jpeg(1000, 800);
    let len = bytes.len() as u64;

    let resp = upload(addr, bytes, "image/jpeg").await;
    assert_eq!(resp.status(), 201);

    let body: PhotoWithThumbnails = resp.json().await.unwrap();
    assert_eq!(body.photo.width, 1000);
    assert_eq!(body.photo.height, 800);
    assert_eq!(body.photo.mime, "image/jpeg");
    assert_eq!(body.photo.size, len);
    assert_eq!(body.thumbnails.len(), 2);
    assert!(body
        .thumbnails
        .iter()
        .all(|t| t.width == 500 && t.height == 400 && t.photo_id == body.photo.id));

    assert!(harness.content.contains(&ContentKey::photo(body.photo.id)));
    assert_eq!(harness.content.len(), 3);
    assert!(harness
        .metadata
        .find_photo(body.photo.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn upload_of_non_image_is_unprocessable() {
    let (harness, addr) = TestHarness::with_server().await;

    let resp = upload(addr, b"plain text".to_vec(), "image/png").await;
    assert_eq!(resp.status(), 422);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "invalid_image");
    assert_eq!(json["failed_at"], "received");
    assert!(harness.content.is_empty());
}

#[tokio::test]
async fn upload_without_photo_field_is_bad_request() {
    let (_harness, addr) = TestHarness::with_server().await;

    let form = Form::new().text("caption", "no file here");
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/photos"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_and_get_photos() {
    let (_harness, addr) = TestHarness::with_server().await;

    let first: PhotoWithThumbnails = upload(addr, png(32, 32), "image/png")
        .await
        .json()
        .await
        .unwrap();
    let second: PhotoWithThumbnails = upload(addr, png(48, 16), "image/png")
        .await
        .json()
        .await
        .unwrap();

    let listed: Vec<Photo> = reqwest::get(format!("http://{addr}/photos"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
    assert!(ids.contains(&first.photo.id));
    assert!(ids.contains(&second.photo.id));

    let resp = reqwest::get(format!("http://{addr}/photos/{}", second.photo.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let got: PhotoWithThumbnails = resp.json().await.unwrap();
    assert_eq!(got, second);
}

#[tokio::test]
async fn unknown_photo_is_not_found() {
    let (_harness, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/photos/{}", PhotoId::new()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let (_harness, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/thumbnails/xyz/url"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ---------------------------------------------------------------------------
// Signed URLs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_urls_for_photo_and_thumbnail() {
    let (_harness, addr) = TestHarness::with_server().await;
    let created: PhotoWithThumbnails = upload(addr, png(64, 64), "image/png")
        .await
        .json()
        .await
        .unwrap();

    let json: serde_json::Value =
        reqwest::get(format!("http://{addr}/photos/{}/url", created.photo.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert!(json["url"]
        .as_str()
        .unwrap()
        .contains(&format!("photos/{}", created.photo.id)));
    assert_eq!(json["expires_in"], 3600);

    let thumb = &created.thumbnails[0];
    let resp = reqwest::get(format!("http://{addr}/thumbnails/{}/url", thumb.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["url"]
        .as_str()
        .unwrap()
        .contains(&format!("thumbnails/{}", thumb.id)));
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_photo_thumbnails_and_content() {
    let (harness, addr) = TestHarness::with_server().await;
    let created: PhotoWithThumbnails = upload(addr, png(64, 64), "image/png")
        .await
        .json()
        .await
        .unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .delete(format!("http://{addr}/photos/{}", created.photo.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(report["thumbnails_removed"], 2);
    assert_eq!(report["orphaned_keys"].as_array().unwrap().len(), 0);

    assert!(harness.content.is_empty());
    assert!(harness
        .metadata
        .find_thumbnails(created.photo.id)
        .await
        .unwrap()
        .is_empty());

    let resp = client
        .delete(format!("http://{addr}/photos/{}", created.photo.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
