//! Scripted local forum for transport tests.
//!
//! Serves plain HTTP/1.1 on `127.0.0.1`, one request per connection, and
//! records every request it answers. Responses come from a routing closure
//! so a test can script per-endpoint behaviour, including sequences.

use crate::{ClientConfig, ForumClient};
use forum_config_and_utils::Credentials;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    /// Path plus query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path() == path
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StubResponse {
    pub status: u16,
    pub body: String,
    pub set_cookies: Vec<String>,
}

impl StubResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::json(200, body)
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.set_cookies.push(cookie.to_string());
        self
    }
}

type Router = dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync;

pub(crate) struct StubForum {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl StubForum {
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Router> = Arc::new(route);

        let handle = tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let requests = Arc::clone(&requests);
                    let route = Arc::clone(&route);
                    tokio::spawn(serve_one(socket, route, requests));
                }
            }
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `METHOD /path` of every request, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url)
            .without_system_proxy()
            .with_warmup_delay(Duration::ZERO)
            .with_timeout(Duration::from_secs(5))
    }
}

impl Drop for StubForum {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("alice", "hunter2")
}

/// Routes for a healthy forum: token, login and an empty latest listing.
pub(crate) fn healthy_forum(request: &RecordedRequest) -> Option<StubResponse> {
    let response = if request.is("GET", "/") {
        StubResponse::json(200, "<html></html>").with_cookie("_forum_session=warm; Path=/")
    } else if request.is("GET", "/session/csrf") {
        StubResponse::ok(r#"{"csrf":"tok-1"}"#)
    } else if request.is("POST", "/session") {
        StubResponse::ok(r#"{"user":{"id":1,"username":"alice"}}"#)
            .with_cookie("_t=fresh; Path=/; HttpOnly")
    } else if request.is("GET", "/latest.json") {
        StubResponse::ok(r#"{"users":[],"topic_list":{"topics":[]}}"#)
    } else {
        return None;
    };
    Some(response)
}

pub(crate) fn not_found() -> StubResponse {
    StubResponse::json(404, r#"{"errors":["not found"]}"#)
}

/// Log in against `forum` with no session cache.
pub(crate) async fn connect(forum: &StubForum) -> ForumClient {
    ForumClient::connect(forum.config(), &credentials())
        .await
        .unwrap()
}

async fn serve_one(
    mut socket: TcpStream,
    route: Arc<Router>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Ok(request) = read_request(&mut socket).await else {
        return;
    };
    let response = route(&request);
    requests.lock().unwrap().push(request);

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        wreq::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown"),
        response.body.len()
    );
    for cookie in &response.set_cookies {
        head.push_str("Set-Cookie: ");
        head.push_str(cookie);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    let _ = socket.write_all(response.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<RecordedRequest> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut start = lines.next().unwrap_or_default().split_whitespace();
    let method = start.next().unwrap_or_default().to_string();
    let target = start.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while raw.len() < header_end + content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
    }
    let body_end = raw.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&raw[header_end..body_end]).to_string();

    Ok(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}
