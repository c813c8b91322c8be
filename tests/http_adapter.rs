//! HTTP listener adapter driven by the orchestrator.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use graceful::config::HttpConfig;
use graceful::error::{BoxError, ComponentError};
use graceful::net::ServeComponent;
use graceful::{ComponentSet, Context, GracefulConfig, HttpServer, ManualSignals};
use tokio_util::sync::CancellationToken;

mod common;
use common::{bounded, Probe};

fn router() -> Router {
    Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "done"
            }),
        )
}

async fn wait_for_addr(server: &HttpServer) -> SocketAddr {
    bounded(async {
        loop {
            if let Some(addr) = server.local_addr() {
                return addr;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

#[tokio::test]
async fn serves_requests_until_signalled() {
    let server = Arc::new(HttpServer::new("127.0.0.1:0", router()));
    let set = ComponentSet::new().with(server.clone());
    let signals = ManualSignals::new();

    let run = {
        let signals = signals.clone();
        tokio::spawn(async move {
            set.graceful_with(&Context::background(), &GracefulConfig::default(), &signals)
                .await
        })
    };

    let addr = wait_for_addr(&server).await;
    let body = reqwest::get(format!("http://{}/", addr))
        .await
        .expect("request")
        .text()
        .await
        .expect("body");
    assert_eq!(body, "Hello, World!");

    signals.trigger();
    let result = bounded(run).await.expect("join");
    assert!(result.is_ok(), "unexpected error: {:?}", result);

    assert!(reqwest::get(format!("http://{}/", addr)).await.is_err());
}

#[tokio::test]
async fn in_flight_request_drains_before_stop_returns() {
    let server = Arc::new(HttpServer::from_config(
        &HttpConfig {
            enabled: true,
            bind_address: "127.0.0.1:0".into(),
            request_timeout_secs: 5,
        },
        router(),
    ));
    let set = ComponentSet::new().with(server.clone());
    let signals = ManualSignals::new();
    let config = GracefulConfig::default().with_shutdown_timeout(Duration::from_secs(2));

    let run = {
        let signals = signals.clone();
        tokio::spawn(async move {
            set.graceful_with(&Context::background(), &config, &signals)
                .await
        })
    };

    let addr = wait_for_addr(&server).await;
    let slow = tokio::spawn(reqwest::get(format!("http://{}/slow", addr)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    signals.trigger();
    let result = bounded(run).await.expect("join");
    assert!(result.is_ok(), "unexpected error: {:?}", result);

    let body = slow
        .await
        .expect("join")
        .expect("in-flight request completes")
        .text()
        .await
        .expect("body");
    assert_eq!(body, "done");
}

#[tokio::test]
async fn bind_conflict_is_a_start_failure() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = occupied.local_addr().expect("addr");

    let worker = Probe::well_behaved("worker");
    let set = ComponentSet::new()
        .with(HttpServer::new(addr.to_string(), router()))
        .with(worker.clone());

    let err = bounded(set.graceful_with(
        &Context::background(),
        &GracefulConfig::default(),
        &ManualSignals::new(),
    ))
    .await
    .expect_err("bind failure surfaces");

    let failure = common::startup_component_error(&err).expect("component failure");
    assert_eq!(failure.component(), "http");
    assert!(matches!(failure, ComponentError::Start { .. }));
    assert!(err.shutdown_failures().is_empty());
    assert_eq!(worker.stops(), 1);
}

#[tokio::test]
async fn serve_component_wraps_any_accept_loop() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");

    let component = ServeComponent::new("raw-tcp", move |stop: CancellationToken| async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                accepted = listener.accept() => {
                    accepted?;
                }
            }
        }
        Ok::<(), BoxError>(())
    });
    let set = ComponentSet::new().with(component);
    let signals = ManualSignals::new();

    let run = {
        let signals = signals.clone();
        tokio::spawn(async move {
            set.graceful_with(&Context::background(), &GracefulConfig::default(), &signals)
                .await
        })
    };

    bounded(async {
        loop {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    signals.trigger();
    let result = bounded(run).await.expect("join");
    assert!(result.is_ok(), "unexpected error: {:?}", result);
}

#[tokio::test]
async fn listen_and_serve_returns_on_caller_cancel() {
    let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = probe.local_addr().expect("addr");
    drop(probe);

    let (ctx, cancel) = Context::background().with_cancel();
    let run = tokio::spawn(async move {
        graceful::listen_and_serve(&ctx, addr.to_string(), router(), &GracefulConfig::default()).await
    });

    bounded(async {
        loop {
            if let Ok(response) = reqwest::get(format!("http://{}/", addr)).await {
                break response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    cancel.cancel();
    let result = bounded(run).await.expect("join");
    assert!(result.is_ok(), "unexpected error: {:?}", result);
}

#[tokio::test]
async fn renamed_server_reports_its_own_name() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = occupied.local_addr().expect("addr");

    let set = ComponentSet::new().with(HttpServer::new(addr.to_string(), router()).with_name("admin-http"));
    assert_eq!(set.names(), vec!["admin-http"]);

    let err = bounded(set.graceful_with(
        &Context::background(),
        &GracefulConfig::default(),
        &ManualSignals::new(),
    ))
    .await
    .expect_err("bind failure surfaces");

    let failure = common::startup_component_error(&err).expect("component failure");
    assert_eq!(failure.component(), "admin-http");
}
