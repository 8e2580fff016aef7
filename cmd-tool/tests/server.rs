use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use cmd_client::{CmdServerClient, CmdServices, UpstreamConfig};
use cmd_core::{AgeKey, CatalogQuery, FinderRequest};
use cmd_tool::server::{router, AppState};
use test_helpers::{votable_fixture, write_isochrone_fixture};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_server(upstream: UpstreamConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::new(AppState::new(upstream)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn upstream(vizier: &MockServer, isochrone_dir: &Path) -> UpstreamConfig {
    UpstreamConfig {
        vizier_url: format!("{}/viz-bin/votable", vizier.uri()),
        isochrone_dir: isochrone_dir.to_path_buf(),
        ..UpstreamConfig::default()
    }
}

#[tokio::test]
async fn test_catalog_proxy_round_trip() {
    let vizier = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/viz-bin/votable"))
        .and(query_param("-c.r", "0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(votable_fixture(&[
            ["250.4", "36.4", "15.0", "16.2", "14.1"],
            ["250.5", "36.5", "16.0", "17.0", "15.5"],
        ])))
        .expect(1)
        .mount(&vizier)
        .await;

    let addr = spawn_server(upstream(&vizier, dir.path())).await;
    let client = CmdServerClient::new(&format!("http://{addr}"));

    let reply = client
        .fetch_catalog(&CatalogQuery::new(250.423, 36.46, 0.1).unwrap())
        .await
        .unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.into_stars().unwrap().len(), 2);
}

#[tokio::test]
async fn test_catalog_missing_coordinates() {
    let vizier = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(upstream(&vizier, dir.path())).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/cmd"))
        .json(&serde_json::json!({"dec": 36.46}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing RA or Dec");
}

#[tokio::test]
async fn test_catalog_upstream_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let addr = spawn_server(UpstreamConfig {
        vizier_url: format!("http://{closed}/viz-bin/votable"),
        isochrone_dir: dir.path().to_path_buf(),
        ..UpstreamConfig::default()
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/cmd"))
        .json(&serde_json::json!({"ra": 10.0, "dec": 20.0}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
}

#[tokio::test]
async fn test_isochrone_endpoint() {
    let vizier = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    write_isochrone_fixture(dir.path(), "parsec_9.0", "0.019", &[(0.6, 4.2), (0.9, 3.1)]);
    let addr = spawn_server(upstream(&vizier, dir.path())).await;
    let client = CmdServerClient::new(&format!("http://{addr}/"));

    let track = client
        .fetch_isochrone(&AgeKey::default(), "0.019")
        .await
        .unwrap();
    assert_eq!(track.len(), 2);

    let err = client
        .fetch_isochrone(&AgeKey::new("parsec_7.0"), "0.019")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Isochrone file not found or server error (404)"
    );
}

#[tokio::test]
async fn test_isochrone_error_bodies() {
    let vizier = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(upstream(&vizier, dir.path())).await;
    let http = reqwest::Client::new();

    let missing = http
        .get(format!("http://{addr}/api/isochrone"))
        .query(&[("age", "parsec_8.0"), ("z", "0.004")])
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Isochrone file 'parsec_8.0_z0004.json' not found");

    let escape = http
        .get(format!("http://{addr}/api/isochrone"))
        .query(&[("age", "../secrets"), ("z", "0.019")])
        .send()
        .await
        .unwrap();
    assert_eq!(escape.status().as_u16(), 400);
}

#[tokio::test]
async fn test_finder_chart_endpoint() {
    let vizier = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(upstream(&vizier, dir.path())).await;
    let client = CmdServerClient::new(&format!("http://{addr}"));

    let chart = client
        .finder_chart(&FinderRequest::for_field(250.423, 36.46, 0.2, 250, 250))
        .await
        .unwrap();
    assert!(chart.finder_chart_url.contains("getjpeg?"));
    assert!(chart.finder_chart_url.contains("scale=5.76"));

    let response = reqwest::get(format!("http://{addr}/api/finder_chart?ra=10"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
