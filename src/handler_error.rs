use std::io::{self, Write};

use crate::response::{default_headers, ResponseWriter};

/// Canonical error response: status line, default headers (content-length
/// computed from `message`), body = `message` bytes. The server uses this to
/// answer with a 400 whenever [`crate::RequestParser`] rejects a request;
/// handlers are free to use it too for their own error paths.
pub struct HandlerError {
    status_code: u16,
    message: String,
}

impl HandlerError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        HandlerError {
            status_code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HandlerError::new(400, message)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn write<W: Write>(&self, sink: W) -> io::Result<()> {
        let mut writer = ResponseWriter::new(sink);
        let reason = crate::status::reason_phrase(self.status_code);
        writer.write_status_line("1.1", self.status_code, reason)?;
        writer.write_headers(&default_headers(self.message.len()))?;
        writer.write_body(self.message.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_emits_expected_bytes() {
        let err = HandlerError::bad_request("malformed header: space before colon");
        let mut out = Vec::new();
        err.write(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(text.contains("content-length: 36\r\n"));
        assert!(text.ends_with("malformed header: space before colon"));
    }
}
