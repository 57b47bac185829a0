//! HTTP request representation.
//!
//! A [`Request`] is built once per connection by the request decoder. Everything
//! read from the wire is immutable afterwards; only two side channels stay writable
//! while the pipeline runs:
//!
//! - `params`: path parameters captured by the route matcher
//! - `body`: the parsed body slot, filled by body-parser middleware

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::query::parse_query;

/// The request line and header block of a request, before its body is read.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub(crate) method: Method,
    pub(crate) route: String,
    pub(crate) version: String,
    pub(crate) headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, route: impl Into<String>, version: impl Into<String>, headers: HeaderMap) -> Self {
        Self { method, route: route.into(), version: version.into(), headers }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    path_segments: Vec<String>,
    raw_query: Option<String>,
    query: Option<HashMap<String, String>>,
    raw_body: Bytes,
    remote_addr: Option<SocketAddr>,
    params: HashMap<String, String>,
    body: Option<Value>,
}

impl Request {
    /// Builds a request from its head and raw body, splitting the route into path
    /// segments and an optional query.
    pub fn from_parts(head: RequestHead, raw_body: Bytes) -> Self {
        let (path, raw_query) = match head.route.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (head.route.as_str(), None),
        };

        let path_segments = split_path(path);
        let query = raw_query.as_deref().map(parse_query);

        Self {
            head,
            path_segments,
            raw_query,
            query,
            raw_body,
            remote_addr: None,
            params: HashMap::new(),
            body: None,
        }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    /// The upper-cased request method.
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// The raw, lower-cased request target including any query string.
    pub fn route(&self) -> &str {
        &self.head.route
    }

    /// The request version token as received, upper-cased.
    pub fn version(&self) -> &str {
        &self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Returns a header value as a string; header values are stored lower-cased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// The media type of the `content-type` header, ignoring its parameters.
    pub fn media_type(&self) -> Option<mime::Mime> {
        let content_type = self.header(http::header::CONTENT_TYPE.as_str())?;
        content_type.parse::<mime::Mime>().ok()
    }

    /// The route without its query string.
    pub fn path(&self) -> &str {
        self.head.route.split_once('?').map_or(self.head.route.as_str(), |(path, _)| path)
    }

    /// Non-empty `/`-separated segments of the path.
    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn query(&self) -> Option<&HashMap<String, String>> {
        self.query.as_ref()
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.as_ref()?.get(key).map(String::as_str)
    }

    /// Deserializes the raw query string, an absent query reads as empty.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(self.raw_query.as_deref().unwrap_or(""))
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote_addr(&mut self, remote_addr: SocketAddr) {
        self.remote_addr = Some(remote_addr);
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The parsed body, absent until a body-parser middleware has run.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut Option<Value> {
        &mut self.body
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Deserializes the parsed body slot into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.body.as_ref().unwrap_or(&Value::Null))
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/').filter(|segment| !segment.is_empty()).map(str::to_owned).collect()
}
