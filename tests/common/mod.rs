//! In-process HTTP responder for driving the client end to end.
//!
//! Every connection gets the same canned status and body. Requests are
//! recorded so tests can check what was sent, or that nothing was.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pinme::config::{AppContext, Settings};
use pinme::limits::SizeLimits;
use tempfile::TempDir;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start(status: u16, body: &str) -> Self {
        Self::start_delayed(status, body, Duration::ZERO)
    }

    /// Like `start`, but every reply is held back for `delay` after the
    /// request body has been read.
    pub fn start_delayed(status: u16, body: &str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let body = body.to_string();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let _ = handle(stream, status, &body, delay, &recorded);
            }
        });

        MockServer { url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn handle(
    stream: TcpStream,
    status: u16,
    body: &str,
    delay: Duration,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> Option<()> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name == "content-length" {
                content_length = value.parse::<usize>().ok();
            } else if name == "transfer-encoding" && value.eq_ignore_ascii_case("chunked") {
                chunked = true;
            }
        }
    }

    let request_body = if chunked {
        read_chunked(&mut reader)?
    } else {
        let mut buf = vec![0u8; content_length.unwrap_or(0)];
        reader.read_exact(&mut buf).ok()?;
        buf
    };

    // Recorded before answering so the client never sees a reply first.
    recorded.lock().unwrap().push(RecordedRequest {
        method,
        target,
        body: request_body,
    });
    thread::sleep(delay);

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size_hex = size_line.trim().split(';').next()?;
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        if size == 0 {
            let mut trailer = String::new();
            reader.read_line(&mut trailer).ok()?;
            return Some(body);
        }
        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk).ok()?;
        body.extend_from_slice(&chunk);
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).ok()?;
    }
}

/// Context pointed at `server`, with state kept under a temp directory.
pub fn context(server: &MockServer, limits: SizeLimits) -> (TempDir, AppContext) {
    let home = TempDir::new().unwrap();
    let settings = Settings {
        api_url: server.url.clone(),
        limits,
        storage_limit_mb: Some(5000),
        preview_url: None,
    };
    let ctx = AppContext::with_config_dir(settings, home.path().join(".pinme")).unwrap();
    (home, ctx)
}
