/// An incremental digest a caller can feed chunk payloads into as they are
/// written, without the writer needing to know which hash algorithm (or
/// none at all) is in use.
///
/// Only the chunk **payload** is ever fed in — never the `size\r\n`/`\r\n`
/// framing bytes. A blanket impl bridges any `sha2`-style `Digest` type;
/// see the demo crate for a concrete example with SHA-256.
pub trait IncrementalDigest {
    fn update(&mut self, data: &[u8]);
}

impl IncrementalDigest for () {
    fn update(&mut self, _data: &[u8]) {}
}

/// Encodes one chunk: `<size-hex>\r\n<data>\r\n`, lowercase hex with no
/// leading zeros. Feeds `data` into `digest` if present, before any framing
/// bytes are written.
pub(crate) fn encode_chunk(data: &[u8], digest: Option<&mut dyn IncrementalDigest>) -> Vec<u8> {
    if let Some(d) = digest {
        d.update(data);
    }

    let mut out = Vec::with_capacity(data.len() + 16);
    out.extend_from_slice(format!("{:x}", data.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

/// The end-of-chunked marker: `0\r\n`. Deliberately missing the second
/// `\r\n` — the following trailer block supplies the final one.
pub(crate) fn encode_last_chunk() -> &'static [u8] {
    b"0\r\n"
}

#[cfg(test)]
mod test {
    use super::*;

    struct Counter(usize);

    impl IncrementalDigest for Counter {
        fn update(&mut self, data: &[u8]) {
            self.0 += data.len();
        }
    }

    #[test]
    fn test_encode_chunk_hex_no_leading_zeros() {
        let out = encode_chunk(b"hi", None);
        assert_eq!(out, b"2\r\nhi\r\n");
    }

    #[test]
    fn test_encode_chunk_eleven_bytes() {
        let out = encode_chunk(b"hello world", None);
        assert_eq!(&out[..1], b"b");
    }

    #[test]
    fn test_digest_only_sees_payload() {
        let mut counter = Counter(0);
        let out = encode_chunk(b"hi", Some(&mut counter));
        assert_eq!(counter.0, 2);
        assert_eq!(out, b"2\r\nhi\r\n");
    }

    #[test]
    fn test_last_chunk_marker_has_no_trailing_crlf() {
        assert_eq!(encode_last_chunk(), b"0\r\n");
    }
}
