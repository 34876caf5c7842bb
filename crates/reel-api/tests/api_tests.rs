//! HTTP-level tests for the video API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use reel_api::error::INTERNAL_ERROR_DETAIL;
use reel_api::{create_router, ApiConfig, AppState};
use reel_db::{init_pool, run_migrations, DatabaseConfig, VideoRepository};
use reel_models::{JobStatus, VideoId, VideoStatus};
use reel_queue::{JobQueue, JobReceiver, QueueConfig};
use reel_storage::{Access, BlobStore, StorageError, StorageResult, UploadedBlob};

const BLOB_URL: &str = "https://cdn.example.com/videos/holiday.mp4";
const THUMB_URL: &str = "https://cdn.example.com/thumbnails/1_abc.jpg";

/// Records deletions; deleting `failing_url` reports failure.
#[derive(Default)]
struct RecordingStore {
    deleted: Mutex<Vec<String>>,
    failing_url: Option<String>,
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn upload(
        &self,
        _data: Vec<u8>,
        key: &str,
        _content_type: &str,
        _access: Access,
    ) -> StorageResult<UploadedBlob> {
        Ok(UploadedBlob {
            url: format!("https://cdn.example.com/{}", key),
            pathname: key.to_string(),
        })
    }

    async fn delete(&self, url: &str) -> bool {
        self.deleted.lock().unwrap().push(url.to_string());
        self.failing_url.as_deref() != Some(url)
    }

    async fn download(&self, url: &str) -> StorageResult<Vec<u8>> {
        Err(StorageError::download_failed(format!("no object at {}", url)))
    }
}

struct TestApp {
    router: Router,
    repo: VideoRepository,
    store: Arc<RecordingStore>,
    receiver: JobReceiver,
}

async fn test_app_with(config: ApiConfig, queue: QueueConfig, store: RecordingStore) -> TestApp {
    let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let repo = VideoRepository::new(pool);

    let store = Arc::new(store);
    let (queue, receiver) = JobQueue::new(queue);
    let state = AppState::new(&config, repo.clone(), store.clone(), queue);

    TestApp {
        router: create_router(state, None),
        repo,
        store,
        receiver,
    }
}

async fn test_app() -> TestApp {
    test_app_with(
        ApiConfig::default(),
        QueueConfig::default(),
        RecordingStore::default(),
    )
    .await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn register(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/videos/register")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_queues_processing() {
    let mut app = test_app().await;

    let (status, body) = send(
        &app.router,
        register(json!({
            "blobUrl": BLOB_URL,
            "blobSize": 1024,
            "blobPathname": "videos/holiday.mp4",
            "title": "Holiday"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["title"], "Holiday");
    assert_eq!(body["message"], "Video registration successful");

    let id = body["id"].as_i64().unwrap();
    let video = app.repo.get(VideoId(id)).await.unwrap();
    assert_eq!(video.status, VideoStatus::Processing);
    assert_eq!(video.file_path, BLOB_URL);
    assert_eq!(video.content_type, "video/mp4");
    assert!(video.upload_completed);

    let job = app.receiver.recv().await.unwrap();
    assert_eq!(job.video_id, VideoId(id));
    assert_eq!(job.file_path, BLOB_URL);
}

#[tokio::test]
async fn test_register_blank_title_gets_default() {
    let app = test_app().await;

    let (status, body) = send(&app.router, register(json!({ "blobUrl": BLOB_URL, "title": "  " }))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["title"].as_str().unwrap().starts_with("Video "));
}

#[tokio::test]
async fn test_register_rejects_bad_url() {
    let app = test_app().await;

    let (status, body) = send(&app.router, register(json!({ "blobUrl": "nope" }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_register_malformed_body() {
    let app = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/videos/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app.router, register(json!({ "title": "no url" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_register_when_queue_full() {
    let app = test_app_with(
        ApiConfig::default(),
        QueueConfig {
            capacity: 1,
            enqueue_timeout: Duration::from_millis(50),
        },
        RecordingStore::default(),
    )
    .await;

    let (status, _) = send(&app.router, register(json!({ "blobUrl": BLOB_URL }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = send(&app.router, register(json!({ "blobUrl": BLOB_URL }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "processing queue is full");

    let page = app.repo.list(0, 10, Some(VideoStatus::Error)).await.unwrap();
    assert_eq!(page.total, 1);
    let job = app.repo.latest_job(page.videos[0].id).await.unwrap().unwrap();
    assert_eq!(job.job_status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("processing queue is full"));
}

#[tokio::test]
async fn test_list_videos() {
    let app = test_app().await;
    for title in ["a", "b", "c"] {
        send(&app.router, register(json!({ "blobUrl": BLOB_URL, "title": title }))).await;
    }

    let (status, body) = send(&app.router, get("/videos?skip=1&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let videos = body["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["title"], "b");
    assert_eq!(videos[0]["status"], "processing");

    let (status, body) = send(&app.router, get("/videos?status=ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_list_videos_unknown_status_is_empty() {
    let app = test_app().await;
    send(&app.router, register(json!({ "blobUrl": BLOB_URL }))).await;

    let (status, body) = send(&app.router, get("/videos?status=done")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["videos"].as_array().unwrap().len(), 0);

    let (status, body) = send(&app.router, get("/videos?status=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_list_videos_rejects_bad_params() {
    let app = test_app().await;

    for uri in [
        "/videos?limit=0",
        "/videos?limit=101",
        "/videos?skip=-1",
        "/videos?limit=abc",
    ] {
        let (status, _) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
    }
}

#[tokio::test]
async fn test_get_video_and_status() {
    let app = test_app().await;
    let (_, body) = send(&app.router, register(json!({ "blobUrl": BLOB_URL, "title": "Clip" }))).await;
    let id = body["id"].as_i64().unwrap();

    let (status, video) = send(&app.router, get(&format!("/videos/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(video["title"], "Clip");
    assert_eq!(video["thumbnail_path"], "");
    assert!(video["duration"].is_null());

    let (status, job) = send(&app.router, get(&format!("/videos/{}/status", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["video_id"], id);
    assert_eq!(job["job_status"], "pending");
    assert!(job["started_at"].is_string());
}

#[tokio::test]
async fn test_missing_video() {
    let app = test_app().await;

    let (status, body) = send(&app.router, get("/videos/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Video not found");

    let (status, body) = send(&app.router, get("/videos/999/status")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Video not found");

    let (status, _) = send(&app.router, delete("/videos/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_video_id() {
    let app = test_app().await;

    let (status, _) = send(&app.router, get("/videos/0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app.router, get("/videos/abc/status")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_video_removes_blobs_and_rows() {
    let app = test_app_with(
        ApiConfig::default(),
        QueueConfig::default(),
        RecordingStore {
            failing_url: Some(BLOB_URL.to_string()),
            ..RecordingStore::default()
        },
    )
    .await;

    let (_, body) = send(&app.router, register(json!({ "blobUrl": BLOB_URL }))).await;
    let id = VideoId(body["id"].as_i64().unwrap());
    let job = app.repo.latest_job(id).await.unwrap().unwrap();
    app.repo
        .complete_processing(id, job.id, THUMB_URL, 12)
        .await
        .unwrap();

    let (status, body) = send(&app.router, delete(&format!("/videos/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // The source blob failed to delete, the rows are gone regardless
    let deleted = app.store.deleted.lock().unwrap().clone();
    assert_eq!(deleted, vec![BLOB_URL.to_string(), THUMB_URL.to_string()]);
    assert!(app.repo.get(id).await.unwrap_err().is_not_found());
    assert!(app.repo.list_jobs(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_internal_errors_redacted_in_production() {
    let production = ApiConfig {
        environment: "production".to_string(),
        ..ApiConfig::default()
    };
    let app = test_app_with(production, QueueConfig::default(), RecordingStore::default()).await;
    app.repo.pool().close().await;

    let (status, body) = send(&app.router, get("/videos")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);

    let dev = test_app().await;
    dev.repo.pool().close().await;
    let (status, body) = send(&dev.router, get("/videos")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(body["detail"], INTERNAL_ERROR_DETAIL);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = test_app().await;

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");

    drop(app.receiver);
    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["checks"]["queue"]["status"], "error");
}

#[tokio::test]
async fn test_security_headers() {
    let app = test_app().await;

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["X-Content-Type-Options"], "nosniff");
    assert!(headers.contains_key("X-Request-ID"));
}
