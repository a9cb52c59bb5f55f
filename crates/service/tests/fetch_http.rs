use std::net::SocketAddr;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{any, get};
use axum::{Json, Router};
use reqwest::Method as ReqMethod;
use serde_json::json;
use tokio::net::TcpListener;

use service::errors::ServiceError;
use service::fetch::{AceFetch, HttpFetch, ReqwestFetch, RequestInit};

async fn echo(method: Method, headers: HeaderMap, body: String) -> String {
    let tag = headers.get("x-ace").and_then(|v| v.to_str().ok()).unwrap_or("-");
    format!("{method} {tag} {body}")
}

async fn start_server() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/status", get(|| async { Json(json!({ "ready": true })) }))
        .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

#[tokio::test]
async fn absolute_urls_reach_the_network_unchanged() -> anyhow::Result<()> {
    let base = start_server().await?;
    for platform in ["win32", "linux"] {
        let fetch = AceFetch::new(platform, ReqwestFetch::new("ace-test")?);
        let resp = fetch.fetch(format!("{base}/status"), None).await?;
        assert!(resp.ok());
        assert_eq!(resp.url, format!("{base}/status"));
        let body: serde_json::Value = resp.json()?;
        assert_eq!(body["ready"], true);
    }
    Ok(())
}

#[tokio::test]
async fn request_options_are_forwarded() -> anyhow::Result<()> {
    let base = start_server().await?;
    let fetch = ReqwestFetch::new("ace-test")?;
    let init = RequestInit::new(ReqMethod::POST).header("x-ace", "shim").body("payload");
    let resp = fetch.fetch(&format!("{base}/echo"), init).await?;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.text()?, "POST shim payload");
    Ok(())
}

#[tokio::test]
async fn non_2xx_is_a_response_not_an_error() -> anyhow::Result<()> {
    let base = start_server().await?;
    let fetch = ReqwestFetch::new("ace-test")?;

    let resp = fetch.fetch(&format!("{base}/teapot"), RequestInit::default()).await?;
    assert_eq!(resp.status, 418);
    assert!(!resp.ok());
    assert_eq!(resp.text()?, "short and stout");

    let resp = fetch.fetch(&format!("{base}/missing"), RequestInit::default()).await?;
    assert_eq!(resp.status, 404);
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() -> anyhow::Result<()> {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let fetch = AceFetch::new("linux", ReqwestFetch::new("ace-test")?);
    let err = fetch.fetch(format!("http://{addr}/x"), None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)), "got {err:?}");
    Ok(())
}
