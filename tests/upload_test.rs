//! Integration tests for the media upload endpoints and static serving.

use std::net::SocketAddr;

use handraise_server::config::Config;
use handraise_server::routes;
use handraise_server::state::AppState;

/// Start the server on a random port and return (base_url, tempdir).
async fn start_test_server() -> (String, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().expect("utf-8 temp path").to_string();

    let config = Config {
        data_dir: data_dir.clone(),
        public_dir: data_dir,
        max_upload_size_mb: 1,
        ..Config::default()
    };
    let state = AppState::new(&config);
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), tmp_dir)
}

#[tokio::test]
async fn upload_returns_reference_and_serves_bytes() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"hello classroom".to_vec())
            .file_name("my notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = client
        .post(format!("{base_url}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    let file_url = body["fileUrl"].as_str().unwrap();
    assert!(file_url.starts_with("/uploads/"));
    assert!(file_url.ends_with("-my_notes.txt"));
    assert_eq!(body["fileType"], "text/plain");

    let served = client
        .get(format!("{base_url}{file_url}"))
        .send()
        .await
        .unwrap();
    assert!(served.status().is_success());
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"hello classroom");
}

#[tokio::test]
async fn voice_upload_uses_its_own_field_name() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "voice",
        reqwest::multipart::Part::bytes(vec![0u8; 64])
            .file_name("clip.webm")
            .mime_str("audio/webm")
            .unwrap(),
    );
    let response = client
        .post(format!("{base_url}/upload-voice"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fileType"], "audio/webm");

    // the generic endpoint rejects a body without its expected field
    let form = reqwest::multipart::Form::new().part(
        "voice",
        reqwest::multipart::Part::bytes(vec![0u8; 8]).file_name("clip.webm"),
    );
    let response = client
        .post(format!("{base_url}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_file_field_is_a_bad_request() {
    let (base_url, _tmp) = start_test_server().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = client
        .post(format!("{base_url}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
