use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::handler_error::HandlerError;
use crate::parser::RequestParser;
use crate::response::ResponseWriter;

/// A handler writes a complete response and reports failure by writing an
/// error response itself — its return value is not consumed.
pub type Handler = Arc<dyn for<'a> Fn(&mut ResponseWriter<&'a TcpStream>, crate::Request) + Send + Sync>;

/// Owns a listener, a handler, and an atomic "running" flag.
///
/// Created running. `close` stops accepting new connections and joins the
/// accept worker; in-flight handlers are allowed to finish on their own
/// threads, which `close` does not wait for — matching spec.md §5's
/// "graceful" shutdown (stop accepting, don't interrupt what's in flight).
pub struct Server {
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
    accept_thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds a listener, spawns the accept worker, and returns immediately.
    pub fn bind<A: ToSocketAddrs>(
        addr: A,
        handler: impl for<'a> Fn(&mut ResponseWriter<&'a TcpStream>, crate::Request) + Send + Sync + 'static,
    ) -> io::Result<Server> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        let running = Arc::new(AtomicBool::new(true));
        let handler: Handler = Arc::new(handler);

        let running_for_thread = running.clone();
        let accept_thread = thread::spawn(move || accept_loop(listener, handler, running_for_thread));

        debug!("server listening on {local_addr}");

        Ok(Server {
            running,
            local_addr,
            accept_thread: Some(accept_thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting new connections and waits for the accept worker to
    /// exit. Safe to call more than once; the second call is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        self.running.store(false, Ordering::Relaxed);

        let Some(accept_thread) = self.accept_thread.take() else {
            return Ok(());
        };

        // `TcpListener::accept` has no built-in cross-thread cancellation in
        // std — the accept worker is blocked inside it. Connecting to
        // ourselves unblocks that one pending `accept()` call so the worker
        // can observe `running == false` and exit the loop before touching
        // the connection.
        let _ = TcpStream::connect(self.local_addr);

        accept_thread
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "accept worker panicked"))?;

        debug!("server on {} stopped", self.local_addr);

        Ok(())
    }
}

fn accept_loop(listener: TcpListener, handler: Handler, running: Arc<AtomicBool>) {
    for stream in listener.incoming() {
        if !running.load(Ordering::Relaxed) {
            debug!("accept worker observed shutdown, exiting");
            break;
        }

        match stream {
            Ok(stream) => {
                let handler = handler.clone();
                thread::spawn(move || handle_connection(stream, &handler));
            }
            Err(e) => {
                warn!("accept failed: {e}");
            }
        }
    }
}

fn handle_connection(stream: TcpStream, handler: &Handler) {
    let mut parser = RequestParser::new();

    match parser.parse(&stream) {
        Ok(request) => {
            let mut writer = ResponseWriter::new(&stream);
            handler(&mut writer, request);
        }
        Err(e) => {
            debug!("rejecting request: {e}");
            let err = HandlerError::bad_request(e.to_string());
            if let Err(io_err) = err.write(&stream) {
                warn!("failed to write error response: {io_err}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hello_handler(writer: &mut ResponseWriter<&TcpStream>, _req: crate::Request) {
        writer.write_status_line("1.1", 200, "OK").unwrap();
        writer
            .write_headers(&crate::response::default_headers(5))
            .unwrap();
        writer.write_body(b"hello").unwrap();
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut server = Server::bind("127.0.0.1:0", hello_handler).unwrap();
        server.close().unwrap();
        server.close().unwrap();
    }
}
