use std::io;

use thiserror::Error;

/// Everything that can go wrong while turning bytes into a [`crate::Request`].
///
/// Every variant here is a *rejection* of untrusted input, not a programmer
/// error — it is always safe to map one of these to a 400 response via
/// [`crate::HandlerError`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("request line has wrong number of tokens")]
    WrongTokenCount,

    #[error("method must be all uppercase ASCII letters")]
    MethodNotUppercase,

    #[error("unsupported http version, only HTTP/1.1 is accepted")]
    UnsupportedVersion,

    #[error("malformed header: space before colon")]
    SpaceBeforeColon,

    #[error("invalid field name")]
    InvalidFieldName,

    #[error("unexpected EOF while parsing headers")]
    UnexpectedEofInHeaders,

    #[error("unexpected EOF before request line was complete")]
    UnexpectedEofInRequestLine,

    #[error("body shorter than Content-Length")]
    BodyShorterThanContentLength,

    #[error("content-length header is not a valid number")]
    BadContentLengthHeader,

    #[error("header section exceeds the {0} byte cap")]
    HeaderSectionTooLarge(usize),
}

/// The crate's umbrella error, covering parse rejections and I/O failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Io(#[from] io::Error),
}
