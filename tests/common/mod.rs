//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use omny::config::{ListenerConfig, OmnyConfig};
use omny::net::{Listener, ListenerError};
use omny::{Dispatched, HttpServer, Method, Request, Router, Shutdown, Version};

/// A GET request for `path`.
pub fn get(path: &str) -> Request {
    Request::new(Method::Get, path, Version::Http11)
}

/// Dispatch `request` into memory and return the outcome and the wire text.
pub fn dispatch(router: &Router, request: &mut Request) -> (Dispatched, String) {
    let mut out = Vec::new();
    let outcome = router.dispatch(request, &mut out).unwrap();
    (outcome, String::from_utf8_lossy(&out).into_owned())
}

/// Counts every `write` call a dispatch makes.
#[derive(Default)]
pub struct RecordingConn {
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
}

impl RecordingConn {
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

impl Write for RecordingConn {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writes.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// A running server on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<OmnyConfig>,
    pub handle: JoinHandle<Result<(), ListenerError>>,
}

/// Start `router` on 127.0.0.1 with an ephemeral port.
pub async fn start_server(router: Router) -> TestServer {
    let config = ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_connections: 16,
        read_timeout_secs: 2,
    };
    let listener = Listener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, update_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(router, &config);
    let handle = tokio::spawn(server.run(listener, update_rx, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        updates,
        handle,
    }
}

/// Send `raw` and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}
