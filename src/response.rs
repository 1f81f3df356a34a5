use std::io::{self, Write};

use log::trace;

use crate::chunk::{encode_chunk, encode_last_chunk, IncrementalDigest};
use crate::header::HeaderSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingStatus,
    AwaitingHeaders,
    AwaitingBody,
    AwaitingTrailers,
    Complete,
}

/// Emits a bit-exact HTTP/1.1 response to a byte sink, one phase at a time.
///
/// The phase sequence `AwaitingStatus -> AwaitingHeaders -> AwaitingBody ->
/// [AwaitingTrailers -> Complete]` is enforced at runtime: calling an
/// operation out of order is a programmer error, not a recoverable
/// condition, and panics rather than silently emitting invalid bytes. (The
/// alternative spec.md §9 allows — encoding the phases in the type system so
/// illegal call sequences don't compile — was considered and rejected here;
/// see DESIGN.md.)
pub struct ResponseWriter<W> {
    sink: W,
    phase: Phase,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        ResponseWriter {
            sink,
            phase: Phase::AwaitingStatus,
        }
    }

    fn require(&self, phase: Phase, op: &str) {
        if self.phase != phase {
            panic!(
                "ResponseWriter::{op} called in phase {:?}, requires {:?} — this is a programmer error",
                self.phase, phase
            );
        }
    }

    /// `HTTP/<version> <code> <reason>\r\n`.
    pub fn write_status_line(&mut self, version: &str, code: u16, reason: &str) -> io::Result<()> {
        self.require(Phase::AwaitingStatus, "write_status_line");
        write!(self.sink, "HTTP/{version} {code} {reason}\r\n")?;
        self.phase = Phase::AwaitingHeaders;
        trace!("wrote status line {} {}", code, reason);
        Ok(())
    }

    /// One `key: value\r\n` per header, then a terminating blank line.
    pub fn write_headers(&mut self, headers: &HeaderSet) -> io::Result<()> {
        self.require(Phase::AwaitingHeaders, "write_headers");
        for (name, value) in headers.iter() {
            write!(self.sink, "{name}: {value}\r\n")?;
        }
        self.sink.write_all(b"\r\n")?;
        self.phase = Phase::AwaitingBody;
        trace!("wrote {} headers", headers.len());
        Ok(())
    }

    /// Writes raw identity-encoded body bytes, no framing. Callable
    /// repeatedly; the connection close is what terminates the body.
    pub fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.require(Phase::AwaitingBody, "write_body");
        self.sink.write_all(bytes)
    }

    /// Writes one chunk: `<size-hex>\r\n<data>\r\n`. If `digest` is
    /// present, `bytes` (payload only) is fed into it before any framing is
    /// written.
    pub fn write_chunked_body(
        &mut self,
        bytes: &[u8],
        digest: Option<&mut dyn IncrementalDigest>,
    ) -> io::Result<()> {
        self.require(Phase::AwaitingBody, "write_chunked_body");
        let chunk = encode_chunk(bytes, digest);
        self.sink.write_all(&chunk)
    }

    /// Writes the `0\r\n` end-of-chunked marker (no trailing `\r\n` — the
    /// trailer block supplies it) and moves to `AwaitingTrailers`.
    pub fn write_chunked_body_done(&mut self) -> io::Result<()> {
        self.require(Phase::AwaitingBody, "write_chunked_body_done");
        self.sink.write_all(encode_last_chunk())?;
        self.phase = Phase::AwaitingTrailers;
        Ok(())
    }

    /// Same wire format as headers. Even with no trailers, a single
    /// `\r\n` terminates the trailer section.
    pub fn write_trailers(&mut self, trailers: &HeaderSet) -> io::Result<()> {
        self.require(Phase::AwaitingTrailers, "write_trailers");
        for (name, value) in trailers.iter() {
            write!(self.sink, "{name}: {value}\r\n")?;
        }
        self.sink.write_all(b"\r\n")?;
        self.phase = Phase::Complete;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// `content-length: N`, `connection: close`, `content-type: text/plain`.
pub fn default_headers(body_len: usize) -> HeaderSet {
    let mut headers = HeaderSet::new();
    headers.set("content-length", body_len.to_string());
    headers.set("connection", "close");
    headers.set("content-type", "text/plain");
    headers
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_line_wire_format() {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line("1.1", 200, "Ok").unwrap();
        assert_eq!(w.into_inner(), b"HTTP/1.1 200 Ok\r\n");
    }

    #[test]
    fn test_headers_then_terminator() {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line("1.1", 200, "Ok").unwrap();
        let mut headers = HeaderSet::new();
        headers.set("content-length", "0");
        w.write_headers(&headers).unwrap();
        let out = w.into_inner();
        assert!(out.ends_with(b"\r\n\r\n"));
        assert!(out.windows(16).any(|w| w == b"content-length: "));
    }

    #[test]
    #[should_panic(expected = "programmer error")]
    fn test_phase_violation_panics() {
        let mut w = ResponseWriter::new(Vec::new());
        // headers before status line: illegal.
        w.write_headers(&HeaderSet::new()).unwrap();
    }

    #[test]
    fn test_plain_body_roundtrip() {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line("1.1", 200, "Ok").unwrap();
        w.write_headers(&default_headers(5)).unwrap();
        w.write_body(b"hello").unwrap();
        assert!(w.into_inner().ends_with(b"hello"));
    }

    #[test]
    fn test_chunked_with_trailers_matches_spec_scenario() {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line("1.1", 200, "Ok").unwrap();
        w.write_headers(&HeaderSet::new()).unwrap();
        w.write_chunked_body(b"hi", None).unwrap();
        w.write_chunked_body_done().unwrap();

        let mut trailers = HeaderSet::new();
        trailers.set_trailer("X-Content-Length", "2");
        trailers.set_trailer("X-Content-Sha256", "deadbeef");
        w.write_trailers(&trailers).unwrap();

        let expected = b"HTTP/1.1 200 Ok\r\n\
            \r\n\
            2\r\nhi\r\n\
            0\r\n\
            X-Content-Length: 2\r\n\
            X-Content-Sha256: deadbeef\r\n\
            \r\n";
        assert_eq!(&w.into_inner()[..], &expected[..]);
    }

    #[test]
    fn test_no_trailers_still_terminates() {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line("1.1", 200, "Ok").unwrap();
        w.write_headers(&HeaderSet::new()).unwrap();
        w.write_chunked_body_done().unwrap();
        w.write_trailers(&HeaderSet::new()).unwrap();
        assert!(w.into_inner().ends_with(b"0\r\n\r\n"));
    }

    #[test]
    fn test_default_headers_values() {
        let h = default_headers(42);
        assert_eq!(h.get("content-length"), "42");
        assert_eq!(h.get("connection"), "close");
        assert_eq!(h.get("content-type"), "text/plain");
    }
}
