//! Real-socket round trips through the HTTP server.

mod common;

use std::fs;
use std::time::Duration;

use common::{send_raw, start_server};
use omny::config::parse_config;
use omny::{views, Router};

fn router() -> Router {
    let mut router = Router::new();
    router.get("/hello", |_, _| Ok(views::text("hi"))).unwrap();
    router
        .get("/player/:id", |req, _| Ok(views::text(format!("player {}", req.param("id").unwrap_or("?")))))
        .unwrap();
    router
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_hello_over_tcp() {
    let server = start_server(router()).await;

    let response = send_raw(server.addr, "GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nServer: Omny\r\nContent-Length: 2\r\nContent-Type: charset=UTF-8\r\n\r\nhi\r\n"
    );

    let response = send_raw(server.addr, "GET /player/54?x=1 HTTP/1.0\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.0 200 OK\r\n"));
    assert!(response.ends_with("player 54\r\n"));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn not_found_and_bad_request() {
    let server = start_server(router()).await;

    let response = send_raw(server.addr, "GET /missing HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.ends_with("\r\n\r\n"));

    let response = send_raw(server.addr, "BREW /pot HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_update_swaps_router() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("about.html"), "<p>about</p>").unwrap();

    let server = start_server(router()).await;
    let config = parse_config(&format!(
        "[[routes]]\npath = \"/about\"\nfile = {:?}\n",
        dir.path().join("about.html").display().to_string()
    ))
    .unwrap();
    server.updates.send(config).unwrap();

    let mut response = String::new();
    for _ in 0..50 {
        response = send_raw(server.addr, "GET /about HTTP/1.1\r\n\r\n").await;
        if response.starts_with("HTTP/1.1 200") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.ends_with("<p>about</p>\r\n\r\n"));

    let response = send_raw(server.addr, "GET /hello HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}
