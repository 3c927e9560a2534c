//! Tests de integración para el servidor de archivos
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en 127.0.0.1 con un puerto efímero,
//! un directorio temporal y un audit log en memoria.

use httpserver::audit::AuditLog;
use httpserver::config::Config;
use httpserver::server::{Server, ServerContext, ShutdownHandle};
use std::fs;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Servidor corriendo en background
struct TestServer {
    addr: SocketAddr,
    data_dir: PathBuf,
    audit: SharedBuffer,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start(threads: usize) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let data_dir = std::env::temp_dir().join(format!(
            "httpserver-it-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&data_dir).unwrap();

        let config = Config {
            port: "0".to_string(),
            host: "127.0.0.1".to_string(),
            threads,
            data_dir: data_dir.to_string_lossy().into_owned(),
            ..Config::default()
        };

        let audit = SharedBuffer::default();
        let ctx = ServerContext::new(&data_dir, AuditLog::new(audit.clone()));
        let server = Server::with_context(config, ctx).expect("Failed to bind server");
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();

        let handle = thread::spawn(move || {
            server.run().expect("Server failed");
        });

        Self {
            addr,
            data_dir,
            audit,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Envía bytes crudos y retorna la response completa
    fn send(&self, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(self.addr).expect("Failed to connect");
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(raw).unwrap();
        stream.flush().unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn get(&self, path: &str) -> String {
        self.send(format!("GET {} HTTP/1.1\r\n\r\n", path).as_bytes())
    }

    fn put(&self, path: &str, body: &str) -> String {
        self.send(
            format!("PUT {} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}", path, body.len(), body)
                .as_bytes(),
        )
    }

    fn audit_lines(&self) -> Vec<String> {
        let bytes = self.audit.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap().lines().map(String::from).collect()
    }

    /// Apaga el servidor y espera a los workers
    fn stop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
        let _ = fs::remove_dir_all(&self.data_dir);
    }
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

#[test]
fn test_put_creates_then_get_reads() {
    let server = TestServer::start(4);

    let response = server.put("/a", "hello");
    assert_eq!(status_line(&response), "HTTP/1.1 201 Created");

    let response = server.get("/a");
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert!(response.contains("Content-Length: 5\r\n"));
    assert_eq!(extract_body(&response), "hello");
}

#[test]
fn test_put_overwrites_existing() {
    let server = TestServer::start(4);
    server.put("/a", "hello");

    let response = server.put("/a", "bye");
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");

    let response = server.get("/a");
    assert_eq!(extract_body(&response), "bye");
}

#[test]
fn test_get_missing_resource() {
    let server = TestServer::start(2);
    let response = server.get("/missing");
    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
}

#[test]
fn test_invalid_name_creates_nothing() {
    let server = TestServer::start(2);

    let response = server.get("/a$b");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let response = server.put("/a$b", "x");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");

    let entries = fs::read_dir(&server.data_dir).unwrap().count();
    assert_eq!(entries, 0);
}

#[test]
fn test_concurrent_puts_same_resource() {
    let server = TestServer::start(4);
    let bodies = ["first-body-aaaaaaaaaaaa", "second-body-bbbbbbbbbbbbbbbbbbbb"];

    let statuses: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = bodies
            .iter()
            .map(|body| {
                let server = &server;
                s.spawn(move || status_line(&server.put("/x", body)).to_string())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut sorted = statuses.clone();
    sorted.sort();
    assert_eq!(sorted, vec!["HTTP/1.1 200 OK", "HTTP/1.1 201 Created"]);

    let content = fs::read_to_string(server.data_dir.join("x")).unwrap();
    assert!(bodies.contains(&content.as_str()), "mixed content: {:?}", content);
}

#[test]
fn test_concurrent_readers_see_full_file() {
    let server = TestServer::start(8);
    let body = "z".repeat(64 * 1024);
    server.put("/big", &body);

    thread::scope(|s| {
        for _ in 0..8 {
            let server = &server;
            let body = &body;
            s.spawn(move || {
                let response = server.get("/big");
                assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
                assert_eq!(extract_body(&response), body.as_str());
            });
        }
    });
}

#[test]
fn test_protocol_errors() {
    let server = TestServer::start(2);

    let response = server.send(b"DELETE /a HTTP/1.1\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 501 Not Implemented");

    let response = server.send(b"GET /a HTTP/1.0\r\n\r\n");
    assert_eq!(status_line(&response), "HTTP/1.1 505 HTTP Version Not Supported");

    let response = server.send(b"PUT /a HTTP/1.1\r\n\r\nhello");
    assert_eq!(status_line(&response), "HTTP/1.1 400 Bad Request");
    assert!(!server.data_dir.join("a").exists());
}

#[test]
fn test_audit_log_lines() {
    let mut server = TestServer::start(1);

    server.send(b"PUT /doc HTTP/1.1\r\nContent-Length: 2\r\nRequest-Id: 7\r\n\r\nhi");
    server.send(b"GET /doc HTTP/1.1\r\nRequest-Id: 8\r\n\r\n");
    server.get("/nope");
    server.stop();

    assert_eq!(
        server.audit_lines(),
        vec!["PUT,/doc,201,7", "GET,/doc,200,8", "GET,/nope,404,0"]
    );
}

#[test]
fn test_shutdown_stops_accepting() {
    let mut server = TestServer::start(2);
    assert_eq!(status_line(&server.get("/none")), "HTTP/1.1 404 Not Found");

    server.stop();
    assert!(server.shutdown.is_shutdown());

    // El listener se cerró junto con el servidor
    assert!(TcpStream::connect(server.addr).is_err());
}
