//! Minimal single-threaded HTTP/1.1 mock server for integration tests.
//!
//! Avoids pulling in an async mock-server crate just to exercise a
//! blocking `reqwest` client: each connection is read, matched against a
//! caller-supplied script of canned `(status, body)` responses keyed by
//! request count, and replied to on a background thread.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct MockServer {
    pub base_url: String,
    pub request_count: Arc<AtomicUsize>,
    _handle: std::thread::JoinHandle<()>,
}

impl MockServer {
    /// Starts a server that answers every request using `responder`, a
    /// closure given the 1-based request number that returns `(status,
    /// body)`.
    pub fn start(responder: impl Fn(usize) -> (u16, String) + Send + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let request_count = Arc::new(AtomicUsize::new(0));
        let count_for_thread = request_count.clone();

        let handle = std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let n = count_for_thread.fetch_add(1, Ordering::SeqCst) + 1;
                let (status, body) = responder(n);
                handle_connection(stream, status, &body);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            request_count,
            _handle: handle,
        }
    }
}

fn handle_connection(mut stream: TcpStream, status: u16, body: &str) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() || line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:").or_else(|| line.strip_prefix("content-length:")) {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        let _ = reader.read_exact(&mut buf);
    }

    let reason = reason_phrase(status);
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
