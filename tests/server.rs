use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use pjm_load_forecast::data::{SynthConfig, generate_records};
use pjm_load_forecast::domain::ArimaOrder;
use pjm_load_forecast::io::save_bundle;
use pjm_load_forecast::models::MultiSeriesModel;
use pjm_load_forecast::server::{AppState, UNSUPPORTED_MEDIA_MESSAGE, create_router};

fn fitted_model() -> MultiSeriesModel {
    let records = generate_records(&SynthConfig::default()).unwrap();
    let mut model = MultiSeriesModel::new(ArimaOrder::default(), 600);
    model.fit_all(&records).unwrap();
    model
}

fn loaded_state() -> Arc<AppState> {
    Arc::new(AppState::with_model(PathBuf::from("unused.json"), fitted_model()))
}

fn invocation(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/invocations")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn ping() -> Request<Body> {
    Request::builder().uri("/ping").body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn ping_is_ok_with_a_model() {
    let response = create_router(loaded_state()).oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_text(response).await, "\n");
}

#[tokio::test]
async fn ping_is_not_found_without_a_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(dir.path().join("model.json")));
    let response = create_router(state.clone()).oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!state.is_loaded());
}

#[tokio::test]
async fn bundle_is_loaded_lazily_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let model = fitted_model();
    let path = save_bundle(dir.path(), &model).unwrap();
    let state = Arc::new(AppState::new(path));
    assert!(!state.is_loaded());

    let response = create_router(state.clone())
        .oneshot(invocation(r#"{"date": "2021-02-01", "time": "01:00", "area": "PE"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.is_loaded());

    let expected = model.predict("2021-02-01", "01:00", "PE".parse().unwrap()).unwrap();
    assert_eq!(body_text(response).await, format!("{expected:.2} MW"));
}

#[tokio::test]
async fn invocation_returns_plain_text_megawatts() {
    let response = create_router(loaded_state())
        .oneshot(invocation(r#"{"date": "2021-02-1", "time": "12:00", "area": "pep"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");

    let text = body_text(response).await;
    let number = text.strip_suffix(" MW").unwrap();
    let (whole, frac) = number.split_once('.').unwrap();
    assert!(!whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(frac.len(), 2);
}

#[tokio::test]
async fn non_json_body_is_unsupported_media() {
    for body in ["date=2021-02-01", "", "null"] {
        let response = create_router(loaded_state()).oneshot(invocation(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE, "body {body:?}");
        assert_eq!(body_text(response).await, UNSUPPORTED_MEDIA_MESSAGE);
    }
}

#[tokio::test]
async fn incomplete_or_unknown_requests_are_bad_requests() {
    for body in [
        r#"{"date": "2021-02-01", "time": "01:00"}"#,
        r#"{"date": "2021-02-01", "time": "01:00", "area": "PE", "extra": 1}"#,
        r#"{"date": "2021-02-01", "time": "01:00", "area": "XX"}"#,
        r#"{"date": "2021-02-01", "time": "25:00", "area": "PE"}"#,
        r#"{"date": "2021-02-01", "time": "01:00", "area": "COMED"}"#,
    ] {
        let response = create_router(loaded_state()).oneshot(invocation(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[tokio::test]
async fn missing_bundle_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(dir.path().join("model.json")));
    let response = create_router(state)
        .oneshot(invocation(r#"{"date": "2021-02-01", "time": "01:00", "area": "PE"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn corrupt_bundle_pings_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, "{ not json").unwrap();
    let state = Arc::new(AppState::new(path));

    let response = create_router(state.clone()).oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "\n");
    assert!(!state.is_loaded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_first_requests_share_one_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_bundle(dir.path(), &fitted_model()).unwrap();
    let state = Arc::new(AppState::new(path));
    let router = create_router(state.clone());

    let loads: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.model().await.unwrap() })
        })
        .collect();
    let pings: Vec<_> = (0..4)
        .map(|_| tokio::spawn(router.clone().oneshot(ping())))
        .collect();

    let mut bundles = Vec::new();
    for handle in loads {
        bundles.push(handle.await.unwrap());
    }
    for handle in pings {
        assert_eq!(handle.await.unwrap().unwrap().status(), StatusCode::OK);
    }
    let first = state.model().await.unwrap();
    assert!(bundles.iter().all(|b| Arc::ptr_eq(b, &first)));
}

#[tokio::test]
async fn far_horizon_forecast_does_not_hold_the_runtime() {
    let router = create_router(loaded_state());

    let far = tokio::spawn(
        router
            .clone()
            .oneshot(invocation(r#"{"date": "2100-01-01", "time": "00:00", "area": "PE"}"#)),
    );
    // Let the forecast start before the health check runs on the same thread.
    tokio::task::yield_now().await;

    let response = router.oneshot(ping()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!far.is_finished());

    let response = far.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.ends_with(" MW"));
}
