//! Minimal HTTP server that answers a fixed script of replies.
//!
//! Each accepted connection consumes one reply. The request line of every
//! connection is captured so tests can assert on the URL the client built.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

pub enum Reply {
    /// Respond with `status` and a JSON body.
    Json { status: u16, body: String },
    /// Respond with `status` and a non-JSON body.
    Text { status: u16, body: String },
    /// Accept the connection and never answer within `Duration`.
    Hang(Duration),
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::Json {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: serde_json::Value) -> Self {
        Self::Json {
            status,
            body: body.to_string(),
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    requests: Receiver<String>,
}

impl StubServer {
    pub fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let (tx, requests) = mpsc::channel();

        thread::spawn(move || {
            for reply in replies {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let request_line = read_request_line(&stream);
                let _ = tx.send(request_line);
                respond(stream, reply);
            }
        });

        Self { base_url, requests }
    }

    /// Request lines received so far, e.g. `GET /table/v1/... HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.try_iter().collect()
    }
}

/// A base URL nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind unused port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn read_request_line(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut first = String::new();
    let _ = reader.read_line(&mut first);
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header.trim().is_empty() => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
    first.trim().to_string()
}

fn respond(mut stream: TcpStream, reply: Reply) {
    let (status, content_type, body) = match reply {
        Reply::Json { status, body } => (status, "application/json", body),
        Reply::Text { status, body } => (status, "text/html", body),
        Reply::Hang(duration) => {
            thread::sleep(duration);
            return;
        }
    };
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
