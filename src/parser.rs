use std::io::Read;
use std::str;

use log::trace;

use crate::error::{Error, ParseError};
use crate::header::{find_crlf, HeaderSet, MAX_HEADER_SECTION_BYTES};
use crate::request::{Request, RequestLine};

const INITIAL_CAPACITY: usize = 8;
const BODY_READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initialized,
    ParsingHeaders,
    Done,
}

/// Incremental state machine that turns an untrusted, chunk-granular byte
/// stream into a validated [`Request`].
///
/// The backing buffer starts at 8 bytes and doubles whenever the read
/// offset reaches capacity; once an incremental step consumes bytes,
/// residual data is shifted to the front and the fill offset decremented.
/// This bounds memory at roughly 2x the largest header section plus body,
/// and makes the parser correct for any read-size schedule — feeding it one
/// byte at a time produces the same `Request` as feeding it the whole thing
/// in one `read()`.
pub struct RequestParser {
    buf: Vec<u8>,
    filled: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        RequestParser {
            buf: vec![0; INITIAL_CAPACITY],
            filled: 0,
        }
    }

    /// Consumes `reader` until a complete request-line, header section, and
    /// (if `Content-Length` says so) body have been read.
    pub fn parse<R: Read>(&mut self, mut reader: R) -> Result<Request, Error> {
        let mut state = State::Initialized;
        let mut line: Option<RequestLine> = None;
        let mut headers = HeaderSet::new();
        let mut header_section_bytes: usize = 0;

        loop {
            match state {
                State::Initialized => {
                    if let Some(idx) = find_crlf(&self.buf[..self.filled]) {
                        let text = str::from_utf8(&self.buf[..idx])
                            .map_err(|_| ParseError::WrongTokenCount)?;
                        line = Some(RequestLine::parse(text)?);
                        self.consume(idx + 2);
                        trace!("request line parsed: {:?}", line);
                        state = State::ParsingHeaders;
                        continue;
                    }
                }
                State::ParsingHeaders => {
                    loop {
                        let (n, done) = headers.parse(&self.buf[..self.filled])?;
                        if n == 0 {
                            break;
                        }
                        self.consume(n);
                        header_section_bytes += n;
                        if header_section_bytes > MAX_HEADER_SECTION_BYTES {
                            return Err(
                                ParseError::HeaderSectionTooLarge(MAX_HEADER_SECTION_BYTES).into(),
                            );
                        }
                        if done {
                            state = State::Done;
                            break;
                        }
                    }
                    if state == State::Done {
                        trace!("headers complete: {} entries", headers.len());
                        continue;
                    }
                }
                State::Done => break,
            }

            if self.filled == self.buf.len() {
                let new_cap = self.buf.len() * 2;
                trace!("growing parse buffer to {} bytes", new_cap);
                self.buf.resize(new_cap, 0);
            }

            let n = reader.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                return Err(match state {
                    State::Initialized => ParseError::UnexpectedEofInRequestLine,
                    State::ParsingHeaders => ParseError::UnexpectedEofInHeaders,
                    State::Done => unreachable!(),
                }
                .into());
            }
            self.filled += n;

            if state != State::Done
                && header_section_bytes + self.filled > MAX_HEADER_SECTION_BYTES
            {
                return Err(ParseError::HeaderSectionTooLarge(MAX_HEADER_SECTION_BYTES).into());
            }
        }

        let body = self.read_body(&mut reader, &headers)?;

        Ok(Request::new(line.expect("request line set by Done"), headers, body))
    }

    fn read_body<R: Read>(&mut self, reader: &mut R, headers: &HeaderSet) -> Result<Vec<u8>, Error> {
        let cl_str = headers.get("content-length");
        let content_length: usize = if cl_str.is_empty() {
            0
        } else {
            cl_str
                .parse()
                .map_err(|_| ParseError::BadContentLengthHeader)?
        };

        if content_length == 0 {
            return Ok(Vec::new());
        }

        let mut body = Vec::with_capacity(content_length);

        let have = self.filled.min(content_length);
        body.extend_from_slice(&self.buf[..have]);
        self.consume(have);

        let mut tmp = [0u8; BODY_READ_CHUNK];
        while body.len() < content_length {
            let want = (content_length - body.len()).min(tmp.len());
            let n = reader.read(&mut tmp[..want])?;
            if n == 0 {
                return Err(ParseError::BodyShorterThanContentLength.into());
            }
            body.extend_from_slice(&tmp[..n]);
        }

        trace!("body read: {} bytes", body.len());

        Ok(body)
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.filled);
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }
}
