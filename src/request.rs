use crate::error::ParseError;
use crate::header::HeaderSet;

/// The first line of an HTTP/1.1 request: `METHOD TARGET HTTP/1.1`.
///
/// Immutable once constructed; `RequestParser` is the only thing that builds
/// one, by way of [`RequestLine::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// Non-empty string of ASCII uppercase letters `A`-`Z` only.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw request-target, opaque ASCII — never URL-decoded.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Always exactly `"1.1"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parses `METHOD SP TARGET SP HTTP/1.1` from a single line (no CRLF).
    pub(crate) fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split(' ');

        let method = tokens.next().ok_or(ParseError::WrongTokenCount)?;
        let target = tokens.next().ok_or(ParseError::WrongTokenCount)?;
        let version_token = tokens.next().ok_or(ParseError::WrongTokenCount)?;

        if tokens.next().is_some() {
            return Err(ParseError::WrongTokenCount);
        }

        if method.is_empty() || !method.bytes().all(|c| c.is_ascii_uppercase()) {
            return Err(ParseError::MethodNotUppercase);
        }

        let mut version_parts = version_token.split('/');
        let scheme = version_parts.next().unwrap_or("");
        let version = version_parts.next().unwrap_or("");
        if version_parts.next().is_some() || scheme != "HTTP" || version != "1.1" {
            return Err(ParseError::UnsupportedVersion);
        }

        Ok(RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
        })
    }
}

/// An incoming request: request-line, headers, and an optional body.
///
/// Built by [`crate::RequestParser`], handed to a handler, dropped when the
/// handler returns.
#[derive(Debug, Clone)]
pub struct Request {
    line: RequestLine,
    headers: HeaderSet,
    body: Vec<u8>,
}

impl Request {
    pub(crate) fn new(line: RequestLine, headers: HeaderSet, body: Vec<u8>) -> Self {
        Request {
            line,
            headers,
            body,
        }
    }

    pub fn line(&self) -> &RequestLine {
        &self.line
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn method(&self) -> &str {
        self.line.method()
    }

    pub fn target(&self) -> &str {
        self.line.target()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let line = RequestLine::parse("GET / HTTP/1.1").unwrap();
        assert_eq!(line.method(), "GET");
        assert_eq!(line.target(), "/");
        assert_eq!(line.version(), "1.1");
    }

    #[test]
    fn test_wrong_token_count() {
        assert_eq!(
            RequestLine::parse("GET / HTTP/1.1 extra").unwrap_err(),
            ParseError::WrongTokenCount
        );
        assert_eq!(
            RequestLine::parse("GET /").unwrap_err(),
            ParseError::WrongTokenCount
        );
    }

    #[test]
    fn test_lowercase_method_rejected() {
        assert_eq!(
            RequestLine::parse("get / HTTP/1.1").unwrap_err(),
            ParseError::MethodNotUppercase
        );
    }

    #[test]
    fn test_wrong_version_rejected() {
        assert_eq!(
            RequestLine::parse("GET / HTTP/2.0").unwrap_err(),
            ParseError::UnsupportedVersion
        );
        assert_eq!(
            RequestLine::parse("GET / HTTP").unwrap_err(),
            ParseError::UnsupportedVersion
        );
        assert_eq!(
            RequestLine::parse("GET / FTP/1.1").unwrap_err(),
            ParseError::UnsupportedVersion
        );
    }
}
