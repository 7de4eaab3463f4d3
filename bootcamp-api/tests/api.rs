//! End-to-end tests against the router, backed by an in-memory store

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bootcamp_api::{config::Config, Application};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const DEVWORKS: &str = "5d713995b721c3bb38c1f5d0";
const MODERNTECH: &str = "5d713a66ec8f2b88b8f830b8";
const BOUNDARY: &str = "bootcamp-test-boundary";

struct TestApp {
    app: Application,
    router: Router,
    _uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.url = "mem://".into();
        config.geocoder.provider = "static".into();
        config.uploads.path = uploads.path().to_path_buf();

        let app = Application::build(config).await.unwrap();
        let router = app.router();
        Self {
            app,
            router,
            _uploads: uploads,
        }
    }

    async fn seeded() -> Self {
        let test = Self::new().await;
        let (status, _) = test.send(Method::POST, "/api/v1/general/data/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        test
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn average_cost(&self, bootcamp_id: &str) -> Value {
        self.app.state().aggregates().flush().await.unwrap();
        let (status, body) = self.get(&format!("/api/v1/bootcamps/{bootcamp_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["averageCost"].clone()
    }
}

fn course(title: &str, tuition: u32) -> Value {
    json!({
        "title": title,
        "description": "Hands-on curriculum",
        "weeks": 8,
        "tuition": tuition,
        "minimumSkill": "beginner",
    })
}

fn multipart_body(file_name: &str, content_type: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn photo_request(bootcamp_id: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/bootcamps/{bootcamp_id}/photo"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_reset_loads_sample_data() {
    let app = TestApp::seeded().await;

    let (status, body) = app.get("/api/v1/bootcamps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 4);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let (_, body) = app.get("/api/v1/courses?limit=100").await;
    assert_eq!(body["count"], 9);
}

#[tokio::test]
async fn test_reset_computes_average_cost() {
    let app = TestApp::seeded().await;
    assert_eq!(app.average_cost(DEVWORKS).await, json!(9000.0));
    assert_eq!(app.average_cost(MODERNTECH).await, json!(11000.0));
}

#[tokio::test]
async fn test_reset_twice_is_idempotent() {
    let app = TestApp::seeded().await;
    let (status, _) = app.send(Method::POST, "/api/v1/general/data/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/bootcamps").await;
    assert_eq!(body["count"], 4);
}

#[tokio::test]
async fn test_filtered_paginated_listing() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .get("/api/v1/bootcamps?careers%5Bin%5D=Web%20Development&limit=2&page=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["nextPage"], 2);
    assert!(body["pagination"].get("prevPage").is_none());

    let (_, body) = app
        .get("/api/v1/bootcamps?careers%5Bin%5D=Web%20Development&limit=2&page=2")
        .await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"]["prevPage"], 1);
    assert!(body["pagination"].get("nextPage").is_none());
}

#[tokio::test]
async fn test_comparison_filter_select_and_sort() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .get("/api/v1/bootcamps?averageCost%5Bgte%5D=10000&select=name,averageCost&sort=-averageCost")
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"].as_array().unwrap();
    let names: Vec<&str> = items.iter().map(|b| b["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["ModernTech Bootcamp", "Codemasters"]);
    for item in items {
        let mut keys: Vec<&str> = item.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["averageCost", "id", "name"]);
    }
}

#[tokio::test]
async fn test_courses_embed_parent_summary() {
    let app = TestApp::seeded().await;

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{DEVWORKS}/courses")).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["bootcamp"], DEVWORKS);

    let (_, body) = app.get("/api/v1/courses?limit=1").await;
    let parent = &body["data"][0]["bootcamp"];
    assert!(parent["name"].is_string());
    assert!(parent["description"].is_string());
    assert!(parent["id"].is_string());
}

#[tokio::test]
async fn test_average_cost_follows_course_writes() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/bootcamps",
            Some(json!({
                "name": "Harbor Code Academy",
                "description": "Evening classes by the water",
                "address": "1 Commonwealth Ave Boston MA 02215",
                "careers": ["Business"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let bootcamp_id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["location"]["coordinates"].is_array());

    let uri = format!("/api/v1/bootcamps/{bootcamp_id}/courses");
    let mut course_ids = Vec::new();
    for (title, tuition) in [("One", 1000), ("Two", 2000), ("Three", 3000)] {
        let (status, body) = app.send(Method::POST, &uri, Some(course(title, tuition))).await;
        assert_eq!(status, StatusCode::CREATED);
        course_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }
    assert_eq!(app.average_cost(&bootcamp_id).await, json!(2000.0));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/courses/{}", course_ids[0]),
            Some(json!({"tuition": 4000})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.average_cost(&bootcamp_id).await, json!(3000.0));

    for id in &course_ids {
        let (status, body) = app
            .send(Method::DELETE, &format!("/api/v1/courses/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({}));
    }
    // Last course gone: the previous value stays
    assert_eq!(app.average_cost(&bootcamp_id).await, json!(3000.0));
}

#[tokio::test]
async fn test_course_under_missing_bootcamp() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/bootcamps/5d725a1b7b292f5f8ceff799/courses",
            Some(course("Orphan", 5000)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "No bootcamp with the id of 5d725a1b7b292f5f8ceff799"
    );
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send(Method::POST, "/api/v1/bootcamps", Some(json!({"name": "Nameless"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Please add a description"));
}

#[tokio::test]
async fn test_radius_search() {
    let app = TestApp::seeded().await;

    let (status, body) = app.get("/api/v1/bootcamps/radius/02215/50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let mut ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, [DEVWORKS, MODERNTECH]);

    let (status, _) = app.get("/api/v1/bootcamps/radius/02215/far").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/v1/bootcamps/radius/99999/50").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Could not geocode 99999");
}

#[tokio::test]
async fn test_photo_upload_rejects_non_images() {
    let app = TestApp::seeded().await;

    let request = photo_request(DEVWORKS, multipart_body("notes.txt", "text/plain", b"hello"));
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please upload an image file");

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{DEVWORKS}")).await;
    assert_eq!(body["data"]["photo"], "no-photo.jpg");
}

#[tokio::test]
async fn test_photo_upload_stores_and_serves_file() {
    let app = TestApp::seeded().await;

    let request = photo_request(DEVWORKS, multipart_body("campus.png", "image/png", b"\x89PNG"));
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::OK);
    let name = format!("photo_{DEVWORKS}.png");
    assert_eq!(body["data"], name.as_str());

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{DEVWORKS}")).await;
    assert_eq!(body["data"]["photo"], name.as_str());

    let request = Request::builder()
        .uri(format!("/uploads/{name}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG");
}

#[tokio::test]
async fn test_photo_upload_rejects_oversized_image() {
    let app = TestApp::seeded().await;
    let max = app.app.state().config().uploads.max_file_upload;

    let just_over = vec![0u8; max + 1];
    let request = photo_request(DEVWORKS, multipart_body("campus.png", "image/png", &just_over));
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!("Please upload an image less than {max} bytes")
    );

    let past_body_limit = vec![0u8; app.app.state().config().upload_body_limit() + 1];
    let request = photo_request(
        DEVWORKS,
        multipart_body("campus.png", "image/png", &past_body_limit),
    );
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!("Please upload an image less than {max} bytes")
    );

    let (_, body) = app.get(&format!("/api/v1/bootcamps/{DEVWORKS}")).await;
    assert_eq!(body["data"]["photo"], "no-photo.jpg");
}

#[tokio::test]
async fn test_page_past_any_store_offset_is_empty() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .get("/api/v1/bootcamps?page=18446744073709551615&limit=10")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"], json!({"limit": 10}));

    let (status, body) = app.get("/api/v1/bootcamps?limit=18446744073709551615").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
}

#[tokio::test]
async fn test_photo_upload_without_file() {
    let app = TestApp::seeded().await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/bootcamps/{DEVWORKS}/photo"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please upload a file");
}

#[tokio::test]
async fn test_delete_bootcamp_removes_its_courses() {
    let app = TestApp::seeded().await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/bootcamps/{DEVWORKS}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/v1/bootcamps/{DEVWORKS}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.get("/api/v1/courses?limit=100").await;
    assert_eq!(body["count"], 7);
}

#[tokio::test]
async fn test_not_found_envelopes() {
    let app = TestApp::seeded().await;

    let (status, body) = app.get("/api/v1/bootcamps/5d725a1b7b292f5f8ceff799").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let (status, body) = app.get("/api/v1/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_shutdown_drains_worker() {
    let app = TestApp::seeded().await;
    let TestApp { app, router, .. } = app;
    drop(router);
    app.shutdown().await.unwrap();
}
