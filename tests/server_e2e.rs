//! End-to-end tests against a bound listener.

use std::net::SocketAddr;
use std::time::Duration;

use image_api::config::ServiceConfig;
use image_api::http::HttpServer;
use image_api::lifecycle::Shutdown;
use tokio::task::JoinHandle;

mod common;
use common::{config_for, fake_png, image_dir};

async fn start_server(config: ServiceConfig) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    (addr, shutdown, handle)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_large_image_over_the_wire() {
    let big = fake_png(3 * 1024 * 1024 + 17);
    let dir = image_dir(&[("merlot", big.as_slice())]);
    let mut config = config_for(dir.path());
    config.images.chunk_size = 8 * 1024;

    let (addr, shutdown, handle) = start_server(config).await;

    let res = client()
        .get(format!("http://{addr}/api/images/merlot"))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert!(res.headers().contains_key("x-request-id"));
    let body = res.bytes().await.unwrap();
    assert_eq!(body.len(), big.len());
    assert!(body.as_ref() == big.as_slice());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_for_same_id() {
    let rose = fake_png(200_000);
    let dir = image_dir(&[("rose", rose.as_slice())]);
    let (addr, shutdown, _handle) = start_server(config_for(dir.path())).await;

    let client = client();
    let url = format!("http://{addr}/api/images/rose");
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                let res = client.get(url).send().await.unwrap();
                (res.status(), res.bytes().await.unwrap())
            })
        })
        .collect();

    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, 200);
        assert!(body.as_ref() == rose.as_slice());
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_error_paths_over_the_wire() {
    let dir = image_dir(&[("rose", &fake_png(64)[..])]);
    let (addr, shutdown, _handle) = start_server(config_for(dir.path())).await;
    let client = client();

    let missing = client
        .get(format!("http://{addr}/api/images/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 400);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"error": true, "message": "File could not be found"})
    );

    let post = client
        .post(format!("http://{addr}/api/images/rose"))
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), 405);
    assert_eq!(post.headers()["allow"], "GET");

    shutdown.trigger();
}
