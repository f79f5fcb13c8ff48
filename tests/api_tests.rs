use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use lacquer::config::Config;
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    config.auth.dev_mode = true;
    config
}

async fn spawn_app() -> Router {
    let state = lacquer::api::create_app_state_from_config(test_config())
        .await
        .expect("Failed to create app state");
    lacquer::api::router(state).await
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let mut config = test_config();
    config.auth.dev_mode = false;
    let state = lacquer::api::create_app_state_from_config(config)
        .await
        .unwrap();
    let app = lacquer::api::router(state).await;

    let (status, body) = request(&app, Method::GET, "/api/polishes", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/polishes")
                .header("Authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_dev_login_disabled_outside_dev_mode() {
    let mut config = test_config();
    config.auth.dev_mode = false;
    let state = lacquer::api::create_app_state_from_config(config)
        .await
        .unwrap();
    let app = lacquer::api::router(state).await;

    let (status, body) = request(&app, Method::POST, "/api/auth/dev-login", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Dev mode not enabled");
}

#[tokio::test]
async fn test_dev_login_is_idempotent() {
    let app = spawn_app().await;

    let (status, body) = request(&app, Method::POST, "/api/auth/dev-login", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["user"]["email"], "dev@localhost");
    let first_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (_, body) = request(&app, Method::POST, "/api/auth/dev-login", None).await;
    assert_eq!(body["data"]["user"]["id"].as_i64().unwrap(), first_id);
}

#[tokio::test]
async fn test_me_returns_current_user() {
    let app = spawn_app().await;

    // Dev mode authenticates every request as the dev user.
    let (status, body) = request(&app, Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "dev@localhost");
    assert_eq!(body["data"]["provider"], "dev");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mut config = test_config();
    config.auth.dev_mode = false;
    let state = lacquer::api::create_app_state_from_config(config.clone())
        .await
        .unwrap();

    let user = state
        .store()
        .get_or_create_user(lacquer::db::NewUser {
            provider: "github".to_string(),
            provider_id: "42".to_string(),
            email: "old@example.com".to_string(),
            name: "Old Token".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap();

    let mut expired_auth = config.auth.clone();
    expired_auth.jwt_expiry_hours = -2;
    let token = lacquer::services::token::issue_token(&user, &expired_auth).unwrap();

    let app = lacquer::api::router(state).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/polishes")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Token expired");
}

#[tokio::test]
async fn test_brands_are_seeded() {
    let app = spawn_app().await;

    let (status, body) = request(&app, Method::GET, "/api/brands", None).await;
    assert_eq!(status, StatusCode::OK);

    let brands = body["data"].as_array().unwrap();
    assert!(brands.len() >= 8);
    assert!(brands.iter().any(|b| b["name"] == "OPI"));
    // No polishes yet, every count is zero.
    assert!(brands.iter().all(|b| b["polish_count"] == 0));
}

#[tokio::test]
async fn test_get_unknown_brand() {
    let app = spawn_app().await;

    let (status, body) = request(&app, Method::GET, "/api/brands/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Brand not found");
}

#[tokio::test]
async fn test_collection_lifecycle() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/collections",
        Some(serde_json::json!({
            "name": "Summer 2026",
            "description": "Beach shades",
            "color": "#FF6F61"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let collection_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/polishes",
        Some(serde_json::json!({
            "name": "Coral Crush",
            "finish_type": "cream",
            "color_hex": "#FF6F61"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let polish_id = body["data"]["id"].as_i64().unwrap();

    // Adding twice is fine, the membership stays unique.
    for _ in 0..2 {
        let (status, _) = request(
            &app,
            Method::POST,
            &format!("/api/collections/{collection_id}/polishes"),
            Some(serde_json::json!({ "polish_id": polish_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = request(
        &app,
        Method::GET,
        &format!("/api/collections/{collection_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["polishes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["polishes"][0]["name"], "Coral Crush");

    let (status, body) = request(&app, Method::GET, "/api/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["polish_count"], 1);

    // Removing a polish that is not a member is a 404.
    let (status, body) = request(
        &app,
        Method::DELETE,
        &format!("/api/collections/{collection_id}/polishes/9999"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Polish not in collection");

    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/collections/{collection_id}/polishes/{polish_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Deleting the collection leaves the polish untouched.
    let (status, _) = request(
        &app,
        Method::DELETE,
        &format!("/api/collections/{collection_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        Method::GET,
        &format!("/api/polishes/{polish_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_collection_update_validation() {
    let app = spawn_app().await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/collections",
        Some(serde_json::json!({ "name": "Reds" })),
    )
    .await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        Method::PUT,
        &format!("/api/collections/{id}"),
        Some(serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (status, _) = request(
        &app,
        Method::PUT,
        &format!("/api/collections/{id}"),
        Some(serde_json::json!({ "color": "not-a-color" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
        &app,
        Method::PUT,
        &format!("/api/collections/{id}"),
        Some(serde_json::json!({ "name": "Deep Reds" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Deep Reds");
}

fn multipart_body(boundary: &str, field: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\nswatch\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(64, 64);
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_polish_image_upload_roundtrip() {
    let uploads_root = std::env::temp_dir().join(format!("lacquer-it-{}", std::process::id()));
    let mut config = test_config();
    config.uploads.uploads_path = uploads_root.to_string_lossy().into_owned();
    let state = lacquer::api::create_app_state_from_config(config)
        .await
        .unwrap();
    let app = lacquer::api::router(state).await;

    let boundary = "lacquer-test-boundary";
    let body = multipart_body(boundary, "image", mime::IMAGE_PNG.as_ref(), &png_bytes());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/upload/polish-image")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["data"]["type"], "swatch");
    let image_url = json["data"]["image_url"].as_str().unwrap();
    assert!(image_url.contains("/swatch/"));
    assert!(json["data"]["thumbnail_url"].as_str().unwrap().contains("/thumb_"));

    let (_, listed) = request(&app, Method::GET, "/api/upload/user-images?type=swatch", None).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    // A text upload is turned away before it reaches the pipeline.
    let body = multipart_body(boundary, "image", mime::TEXT_PLAIN.as_ref(), b"hello");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/upload/polish-image")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "Only image files are accepted");

    tokio::fs::remove_dir_all(&uploads_root).await.ok();
}

#[tokio::test]
async fn test_nail_art_single_and_multiple_batch() {
    let uploads_root = std::env::temp_dir().join(format!(
        "lacquer-it-batch-{}",
        uuid::Uuid::new_v4()
    ));
    let mut config = test_config();
    config.uploads.uploads_path = uploads_root.to_string_lossy().into_owned();
    let state = lacquer::api::create_app_state_from_config(config)
        .await
        .unwrap();
    let app = lacquer::api::router(state).await;

    let boundary = "lacquer-test-boundary";
    let png = png_bytes();

    // Nail-art takes exactly one `image` field.
    let body = multipart_body(boundary, "image", mime::IMAGE_PNG.as_ref(), &png);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/upload/nail-art")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["data"]["type"], "nail-art");
    assert!(json["data"]["image_url"].as_str().unwrap().contains("/nail-art/"));

    // The batch endpoint takes several `images` fields and a shared type.
    let mut body = Vec::new();
    for _ in 0..2 {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"art.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"type\"\r\n\r\nswatch\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/upload/multiple")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let uploaded = json["data"].as_array().unwrap();
    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|u| u["type"] == "swatch"));

    tokio::fs::remove_dir_all(&uploads_root).await.ok();
}

#[tokio::test]
async fn test_delete_image_requires_ownership() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        Method::DELETE,
        "/api/upload/image",
        Some(serde_json::json!({ "image_url": "/uploads/users/999/bottle/x.jpg" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to delete this image");
}

#[tokio::test]
async fn test_list_user_images_empty() {
    let app = spawn_app().await;

    let (status, body) = request(&app, Method::GET, "/api/upload/user-images", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = request(
        &app,
        Method::GET,
        "/api/upload/user-images?type=selfie",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
