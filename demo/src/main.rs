use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use sha2::{Digest, Sha256};

use barehttp::{default_headers, HeaderSet, IncrementalDigest, Request, ResponseWriter, Server};

/// Bridges `sha2::Sha256` into the chunk encoder's digest hook.
struct Sha256Digest(Sha256);

impl IncrementalDigest for Sha256Digest {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }
}

fn handle(writer: &mut ResponseWriter<&TcpStream>, req: Request) {
    let target = req.target().to_string();

    if target == "/" {
        serve_hello(writer);
    } else if target == "/echo" {
        serve_echo(writer, &req);
    } else if let Some(rest) = target.strip_prefix("/stream/") {
        match rest.parse::<u32>() {
            Ok(count) => serve_stream(writer, count),
            Err(_) => serve_404(writer, &target),
        }
    } else {
        serve_404(writer, &target);
    }
}

fn serve_hello(writer: &mut ResponseWriter<&TcpStream>) {
    let body = b"hello from barehttp\n";
    writer.write_status_line("1.1", 200, "OK").unwrap();
    writer.write_headers(&default_headers(body.len())).unwrap();
    writer.write_body(body).unwrap();
}

fn serve_echo(writer: &mut ResponseWriter<&TcpStream>, req: &Request) {
    let body = req.body();
    writer.write_status_line("1.1", 200, "OK").unwrap();
    writer.write_headers(&default_headers(body.len())).unwrap();
    writer.write_body(body).unwrap();
}

/// Emits `count` chunks, then a trailer naming the chunk count and a
/// SHA-256 hex digest of the concatenated chunk payloads.
fn serve_stream(writer: &mut ResponseWriter<&TcpStream>, count: u32) {
    writer.write_status_line("1.1", 200, "OK").unwrap();

    let mut headers = HeaderSet::new();
    headers.set("connection", "close");
    headers.set("content-type", "text/plain");
    headers.set("transfer-encoding", "chunked");
    headers.set("trailer", "x-chunk-count, x-content-sha256");
    writer.write_headers(&headers).unwrap();

    let mut digest = Sha256Digest(Sha256::new());
    for i in 0..count {
        let chunk = format!("chunk-{i}\n");
        writer
            .write_chunked_body(chunk.as_bytes(), Some(&mut digest))
            .unwrap();
    }
    writer.write_chunked_body_done().unwrap();

    let hash = digest.0.finalize();
    let hash_hex = hash.iter().map(|b| format!("{b:02x}")).collect::<String>();

    let mut trailers = HeaderSet::new();
    trailers.set_trailer("x-chunk-count", count.to_string());
    trailers.set_trailer("x-content-sha256", hash_hex);
    writer.write_trailers(&trailers).unwrap();
}

fn serve_404(writer: &mut ResponseWriter<&TcpStream>, target: &str) {
    let message = format!("no route for {target}");
    writer.write_status_line("1.1", 404, "Not Found").unwrap();
    writer
        .write_headers(&default_headers(message.len()))
        .unwrap();
    writer.write_body(message.as_bytes()).unwrap();
}

fn main() {
    env_logger::init();

    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7878);

    let mut server = Server::bind(("127.0.0.1", port), handle).expect("failed to bind listener");
    info!("demo server listening on {}", server.local_addr());

    let shutting_down = Arc::new(AtomicBool::new(false));
    let shutting_down_for_handler = shutting_down.clone();
    ctrlc::set_handler(move || {
        shutting_down_for_handler.store(true, Ordering::Relaxed);
    })
    .expect("failed to install signal handler");

    while !shutting_down.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    info!("shutting down");
    server.close().expect("failed to close server cleanly");
}
