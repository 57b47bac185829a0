//! Body parsing middleware.
//!
//! Both parsers fill [`Request::body`] from the raw body when the request's media type
//! is theirs, and otherwise make sure the slot at least holds an empty JSON object, so
//! handlers further down the pipeline can rely on it being present.

use async_trait::async_trait;
use mote_http::handler::{Flow, Handler, HandlerResult};
use mote_http::protocol::query::parse_query;
use mote_http::protocol::{Request, Response};
use serde_json::{Map, Value};
use tracing::{trace, warn};

/// Parses `application/json` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyParser;

/// Parses `application/x-www-form-urlencoded` bodies into an object of strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncodedBodyParser;

pub fn json_body_parser() -> JsonBodyParser {
    JsonBodyParser
}

pub fn url_encoded_body_parser() -> UrlEncodedBodyParser {
    UrlEncodedBodyParser
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn has_media_type(req: &Request, expected: &mime::Mime) -> bool {
    req.media_type().is_some_and(|media_type| media_type.essence_str() == expected.essence_str())
}

#[async_trait]
impl Handler for JsonBodyParser {
    async fn call(&self, req: &mut Request, _resp: &mut Response) -> HandlerResult {
        req.body_mut().get_or_insert_with(empty_object);

        if !has_media_type(req, &mime::APPLICATION_JSON) {
            return Ok(Flow::Next);
        }

        match serde_json::from_slice::<Value>(req.raw_body()) {
            Ok(body) => {
                trace!("parsed json body");
                req.set_body(body);
            }
            Err(e) => {
                warn!(cause = %e, route = req.route(), "invalid json body, keep it empty");
                req.set_body(empty_object());
            }
        }
        Ok(Flow::Next)
    }
}

#[async_trait]
impl Handler for UrlEncodedBodyParser {
    async fn call(&self, req: &mut Request, _resp: &mut Response) -> HandlerResult {
        req.body_mut().get_or_insert_with(empty_object);

        if !has_media_type(req, &mime::APPLICATION_WWW_FORM_URLENCODED) {
            return Ok(Flow::Next);
        }

        let raw_body = String::from_utf8_lossy(req.raw_body());
        let form = parse_query(&raw_body).into_iter().map(|(key, value)| (key, Value::String(value))).collect::<Map<_, _>>();
        req.set_body(Value::Object(form));
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, Method};
    use mote_http::protocol::RequestHead;
    use serde::Deserialize;
    use serde_json::json;

    fn request(content_type: Option<&'static str>, body: &'static str) -> Request {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Request::from_parts(RequestHead::new(Method::POST, "/", "HTTP/1.1", headers), Bytes::from_static(body.as_bytes()))
    }

    async fn run(handler: impl Handler, req: &mut Request) {
        let (_client, server) = tokio::io::duplex(1024);
        let mut resp = Response::new(server);
        assert_eq!(handler.call(req, &mut resp).await.unwrap(), Flow::Next);
        assert!(!resp.has_responded());
    }

    #[tokio::test]
    async fn json_body_is_parsed() {
        #[derive(Deserialize)]
        struct User {
            name: String,
            age: u32,
        }

        let mut req = request(Some("application/json; charset=utf-8"), r#"{"name":"ab","age":3}"#);
        run(json_body_parser(), &mut req).await;

        let user: User = req.body_as().unwrap();
        assert_eq!(user.name, "ab");
        assert_eq!(user.age, 3);
    }

    #[tokio::test]
    async fn invalid_json_leaves_empty_object() {
        let mut req = request(Some("application/json"), "{not json");
        run(json_body_parser(), &mut req).await;

        assert_eq!(req.body(), Some(&json!({})));
    }

    #[tokio::test]
    async fn other_media_types_are_ignored() {
        let mut req = request(Some("text/plain"), r#"{"a":1}"#);
        run(json_body_parser(), &mut req).await;
        assert_eq!(req.body(), Some(&json!({})));

        let mut req = request(None, "a=1");
        run(url_encoded_body_parser(), &mut req).await;
        assert_eq!(req.body(), Some(&json!({})));
    }

    #[tokio::test]
    async fn existing_body_is_kept_for_other_media_types() {
        let mut req = request(Some("application/json"), r#"{"a":1}"#);
        run(json_body_parser(), &mut req).await;
        run(url_encoded_body_parser(), &mut req).await;

        assert_eq!(req.body(), Some(&json!({"a": 1})));
    }

    #[tokio::test]
    async fn url_encoded_body_is_parsed() {
        let mut req = request(Some("application/x-www-form-urlencoded"), "name=a%20b&tag=x&tag=y&empty");
        run(url_encoded_body_parser(), &mut req).await;

        assert_eq!(req.body(), Some(&json!({"name": "a b", "tag": "y", "empty": ""})));
    }
}
