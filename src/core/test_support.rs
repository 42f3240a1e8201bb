// Minimal HTTP/1.1 server for network tests. Serves fixed routes, answers
// 404 for everything else and records every hit.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl Route {
    pub fn ok(path: &str, body: Vec<u8>) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            body,
        }
    }

    pub fn status(path: &str, status: u16) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: Vec::new(),
        }
    }

    pub fn json(path: &str, value: serde_json::Value) -> Self {
        Self::ok(path, value.to_string().into_bytes())
    }
}

type RouteTable = Arc<Mutex<HashMap<String, Route>>>;

pub struct TestServer {
    addr: SocketAddr,
    routes: RouteTable,
    hits: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl TestServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: RouteTable = Arc::new(Mutex::new(
            routes.into_iter().map(|r| (r.path.clone(), r)).collect(),
        ));
        let hits: Arc<Mutex<HashMap<String, Vec<Instant>>>> = Arc::default();

        let hits_for_loop = hits.clone();
        let routes_for_loop = routes.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes_for_loop.clone();
                let hits = hits_for_loop.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buf);
                    let path = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    hits.lock()
                        .unwrap()
                        .entry(path.clone())
                        .or_default()
                        .push(Instant::now());

                    let (status, body) = match routes.lock().unwrap().get(&path) {
                        Some(route) => (route.status, route.body.clone()),
                        None => (404, Vec::new()),
                    };
                    let header = format!(
                        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = socket.write_all(header.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, routes, hits }
    }

    /// Replace the served routes, for documents that embed the server's own URL.
    pub fn set_routes(&self, routes: Vec<Route>) {
        *self.routes.lock().unwrap() = routes.into_iter().map(|r| (r.path.clone(), r)).collect();
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hit_times(path).len()
    }

    pub fn hit_times(&self, path: &str) -> Vec<Instant> {
        self.hits
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().map(Vec::len).sum()
    }
}
