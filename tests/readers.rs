use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode};
use reverse_rewrite::config::{AppConfig, RuleConfig};
use reverse_rewrite::conn::MatchSource;
use reverse_rewrite::metrics::Metrics;
use reverse_rewrite::readers::healthcheck::handle_healthcheck;
use reverse_rewrite::rewrite::create_rewriter;
use reverse_rewrite::server::ServerResources;
use std::sync::Arc;

fn resources() -> ServerResources {
    let mut config = AppConfig::default();
    config.reverse.reverse_only = true;
    config.reverse.rules = vec![
        RuleConfig::path("/api", "http://api/"),
        RuleConfig::host("shop", "http://shop/"),
    ];
    let rewriter = create_rewriter(&config.reverse);
    ServerResources::new(Arc::new(config), rewriter, Arc::new(Metrics::new()))
}

async fn body_json(response: hyper::Response<http_body_util::Full<Bytes>>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let resources = resources();
    let req = Request::builder().uri("/health").body(()).unwrap();

    let response = handle_healthcheck(&req, &resources);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "reverse-rewrite");
    assert_eq!(json["rules"], 2);
    assert_eq!(json["reverse_only"], true);
}

#[tokio::test]
async fn test_health_reflects_reload() {
    let resources = resources();
    let mut reloaded = AppConfig::default();
    reloaded.reverse.rules = vec![RuleConfig::path("/", "http://all/")];
    resources.rewriter.reload(&reloaded.reverse);

    let req = Request::builder().uri("/health").body(()).unwrap();
    let json = body_json(handle_healthcheck(&req, &resources)).await;
    assert_eq!(json["rules"], 1);
    assert_eq!(json["reverse_only"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let resources = resources();
    resources.metrics.record_rewrite(MatchSource::Host);
    resources.metrics.record_rejected();

    let req = Request::builder().uri("/metrics").body(()).unwrap();
    let response = handle_healthcheck(&req, &resources);
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["host_rewrites"], 1);
    assert_eq!(json["rejected"], 1);
}

#[test]
fn test_unknown_path() {
    let resources = resources();
    let req = Request::builder().uri("/nope").body(()).unwrap();
    assert_eq!(
        handle_healthcheck(&req, &resources).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_method_not_allowed() {
    let resources = resources();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/health")
        .body(())
        .unwrap();
    assert_eq!(
        handle_healthcheck(&req, &resources).status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}
