//! HTTP header decoder implementation for parsing request lines and header blocks
//!
//! The decoder consumes the stream one line at a time and never buffers more than a
//! single line: the request line first, then header lines up to the empty line
//! that terminates the header block.
//!
//! # Leniency
//!
//! The parser follows the needs of small devices rather than the full grammar:
//!
//! - the request line needs at least three space separated tokens, extra tokens are ignored
//! - the method and version are upper-cased, the target is lower-cased
//! - header lines without a `:` (or with an illegal name or value) are skipped
//! - header names and values are trimmed and lower-cased
//! - both `\r\n` and a lone `\n` end a line, empty lines before the request line are ignored
//!
//! # Limits
//!
//! - Maximum size of a single line: 8KB
//! - Maximum number of header lines: 64

use bytes::BytesMut;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, RequestHead};

/// Maximum number of header lines allowed in a request
pub(crate) const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for one line of the request head
pub(crate) const MAX_LINE_BYTES: usize = 8 * 1024;

/// Decoder for the request line and headers, implementing the [`Decoder`] trait.
///
/// It yields the parsed [`RequestHead`] together with the [`PayloadSize`] declared by
/// `Content-Length`.
#[derive(Debug, Default)]
pub struct HeaderDecoder {
    state: State,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    RequestLine,
    Headers { head: RequestHead, header_lines: usize },
}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the request line has been read.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::RequestLine)
    }
}

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    /// Attempts to decode the request head from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((head, payload_size)))` once the empty line ending the headers was read
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if the request line is malformed or a limit is exceeded
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(line) = next_line(src)? {
            match &mut self.state {
                State::RequestLine if line.is_empty() => {
                    trace!("skip empty line before request line");
                }

                State::RequestLine => {
                    let head = parse_request_line(&line)?;
                    trace!(method = %head.method, route = %head.route, "parsed request line");
                    self.state = State::Headers { head, header_lines: 0 };
                }

                State::Headers { .. } if line.is_empty() => {
                    // the empty line ends the header block, reset for the next request
                    if let State::Headers { head, .. } = std::mem::take(&mut self.state) {
                        let payload_size = parse_payload(&head)?;
                        return Ok(Some((head, payload_size)));
                    }
                }

                State::Headers { head, header_lines } => {
                    *header_lines += 1;
                    ensure!(*header_lines <= MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));

                    match parse_header_line(&line) {
                        Some((name, value)) => {
                            head.headers.insert(name, value);
                        }
                        None => debug!(line = %String::from_utf8_lossy(&line), "skip malformed header line"),
                    }
                }
            }
        }

        Ok(None)
    }
}

/// Splits the next line off `src`, without its `\r\n` or `\n` terminator.
fn next_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    let Some(pos) = src.iter().position(|b| *b == b'\n') else {
        ensure!(src.len() <= MAX_LINE_BYTES, ParseError::too_large_line(src.len(), MAX_LINE_BYTES));
        return Ok(None);
    };

    ensure!(pos <= MAX_LINE_BYTES, ParseError::too_large_line(pos, MAX_LINE_BYTES));

    let mut line = src.split_to(pos + 1);
    line.truncate(pos);
    if line.last() == Some(&b'\r') {
        line.truncate(pos - 1);
    }
    Ok(Some(line))
}

fn parse_request_line(line: &[u8]) -> Result<RequestHead, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::invalid_request("request line is not utf8"))?;

    // runs of spaces count as one separator
    let mut tokens = line.split(' ').filter(|token| !token.is_empty());
    let (Some(method), Some(route), Some(version)) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ParseError::invalid_request(format!("request line needs three tokens: {line:?}")));
    };

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ParseError::invalid_request(format!("invalid method {method:?}")))?;

    Ok(RequestHead::new(method, route.to_lowercase(), version.to_ascii_uppercase(), HeaderMap::new()))
}

fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = line.iter().position(|b| *b == b':')?;
    let (name, value) = (&line[..colon], &line[colon + 1..]);

    let name = HeaderName::from_bytes(name.trim_ascii()).ok()?;
    let value = HeaderValue::from_bytes(&value.trim_ascii().to_ascii_lowercase()).ok()?;
    Some((name, value))
}

/// Determines the body size from the `Content-Length` header.
///
/// Chunked request bodies are not supported, so any other request has no body.
///
/// # Errors
///
/// Returns `ParseError` if the Content-Length value is not a valid number
fn parse_payload(head: &RequestHead) -> Result<PayloadSize, ParseError> {
    let Some(cl_value) = head.headers.get(http::header::CONTENT_LENGTH) else {
        return Ok(PayloadSize::Empty);
    };

    let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;
    let length = cl_str.parse::<u64>().map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

    Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn decode_all(str: &str) -> Result<Option<(RequestHead, PayloadSize)>, ParseError> {
        let mut buf = BytesMut::from(str);
        HeaderDecoder::new().decode(&mut buf)
    }

    #[test]
    fn test_bytes_mut_lens() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##};

        let mut bytes = BytesMut::from(str);
        let result = HeaderDecoder::new().decode(&mut bytes).unwrap();

        assert!(result.is_some());
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /Index.HTML HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let (head, payload_size) = decode_all(str).unwrap().unwrap();

        assert!(payload_size.is_empty());
        assert_eq!(head.method(), &Method::GET);
        assert_eq!(head.route(), "/index.html");
        assert_eq!(head.version(), "HTTP/1.1");
        assert_eq!(head.headers().len(), 3);
        assert_eq!(head.headers().get(http::header::ACCEPT).unwrap(), "*/*");
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "127.0.0.1:8080");
        assert_eq!(head.headers().get(http::header::USER_AGENT).unwrap(), "curl/7.79.1");
    }

    #[test]
    fn crlf_lines_and_case_folding() {
        let str = "post /Users?Name=AB http/1.0\r\nContent-Type : Application/JSON \r\nContent-Length: 2\r\n\r\n{}";

        let (head, payload_size) = decode_all(str).unwrap().unwrap();

        assert_eq!(head.method(), &Method::POST);
        assert_eq!(head.route(), "/users?name=ab");
        assert_eq!(head.version(), "HTTP/1.0");
        assert_eq!(head.headers().get(http::header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(payload_size, PayloadSize::Length(2));
    }

    #[test]
    fn malformed_header_lines_are_skipped() {
        let str = indoc! {r##"
        GET / HTTP/1.1
        this line has no colon
        Host: localhost
        bad name: value

        "##};

        let (head, _) = decode_all(str).unwrap().unwrap();
        assert_eq!(head.headers().len(), 1);
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "localhost");
    }

    #[test]
    fn header_value_keeps_everything_after_first_colon() {
        let (head, _) = decode_all("GET / HTTP/1.1\r\nHost: 127.0.0.1:8080\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "127.0.0.1:8080");
    }

    #[test]
    fn last_duplicate_header_wins() {
        let (head, _) = decode_all("GET / HTTP/1.1\r\nX-Id: 1\r\nX-Id: 2\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.headers().get("x-id").unwrap(), "2");
    }

    #[test]
    fn request_line_needs_three_tokens() {
        let result = decode_all("GET /\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidRequest { .. })));
    }

    #[test]
    fn leading_empty_lines_are_ignored() {
        let (head, _) = decode_all("\r\n\r\nGET / HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.method(), &Method::GET);
    }

    #[test]
    fn partial_head_needs_more_data() {
        let mut decoder = HeaderDecoder::new();
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost: loc");

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(!decoder.is_idle());
        assert_eq!(&buf[..], b"Host: loc");

        buf.extend_from_slice(b"alhost\r\n\r\n");
        let (head, _) = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "localhost");
        assert!(decoder.is_idle());
    }

    #[test]
    fn invalid_content_length() {
        let result = decode_all("POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn too_long_line() {
        let line = format!("GET /{} HTTP/1.1", "a".repeat(MAX_LINE_BYTES));
        let result = decode_all(&line);
        assert!(matches!(result, Err(ParseError::TooLargeLine { .. })));
    }

    #[test]
    fn too_many_headers() {
        let mut str = String::from("GET / HTTP/1.1\r\n");
        for i in 0..=MAX_HEADER_NUM {
            str.push_str(&format!("X-H{i}: v\r\n"));
        }
        str.push_str("\r\n");

        let result = decode_all(&str);
        assert!(matches!(result, Err(ParseError::TooManyHeaders { .. })));
    }

    #[test]
    fn repeated_spaces_in_request_line() {
        let (head, _) = decode_all("GET  /users   HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert_eq!(head.method(), Method::GET);
        assert_eq!(head.route(), "/users");
        assert_eq!(head.version(), "HTTP/1.1");

        assert!(matches!(decode_all("GET  HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidRequest { .. })));
    }
}
