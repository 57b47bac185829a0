//! URL query string codec.
//!
//! Decodes `a=1&b=2` style strings, used both for request query strings and for
//! `application/x-www-form-urlencoded` bodies. Only a fixed table of percent
//! escapes (space and common punctuation) is understood. It is not a
//! general percent-decoder, so unknown escapes are kept as they are.

use std::collections::HashMap;

/// Escapes understood by [`decode_component`], keyed by the two hex digits after `%`.
const ESCAPES: &[(&[u8; 2], char)] = &[
    (b"20", ' '),
    (b"21", '!'),
    (b"22", '"'),
    (b"23", '#'),
    (b"24", '$'),
    (b"25", '%'),
    (b"26", '&'),
    (b"27", '\''),
    (b"28", '('),
    (b"29", ')'),
    (b"2A", '*'),
    (b"2B", '+'),
    (b"2C", ','),
    (b"2F", '/'),
    (b"3A", ':'),
    (b"3B", ';'),
    (b"3C", '<'),
    (b"3D", '='),
    (b"3E", '>'),
    (b"3F", '?'),
    (b"40", '@'),
    (b"5B", '['),
    (b"5C", '\\'),
    (b"5D", ']'),
    (b"5E", '^'),
    (b"60", '`'),
    (b"7B", '{'),
    (b"7C", '|'),
    (b"7D", '}'),
    (b"7E", '~'),
];

/// Parses a query string into a key/value map.
///
/// Every `&`-separated pair is decoded; a pair without `=` gets an empty value and a
/// later key overwrites an earlier one.
///
/// ```
/// use mote_http::protocol::query::parse_query;
///
/// let query = parse_query("a=1&b=2&a=3");
/// assert_eq!(query.get("a").map(String::as_str), Some("3"));
/// assert_eq!(query.get("b").map(String::as_str), Some("2"));
/// ```
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut data = HashMap::new();

    for kv in query.split('&').filter(|kv| !kv.is_empty()) {
        let (key, value) = kv.split_once('=').unwrap_or((kv, ""));
        data.insert(decode_component(key), decode_component(value));
    }

    data
}

/// Decodes the escapes of the fixed table in a single left-to-right pass.
///
/// Hex digits match case-insensitively. A decoded `%` never starts another escape.
pub fn decode_component(component: &str) -> String {
    if !component.contains('%') {
        return component.to_owned();
    }

    let mut decoded = String::with_capacity(component.len());
    let mut rest = component;

    while let Some(pos) = rest.find('%') {
        decoded.push_str(&rest[..pos]);
        let escape = &rest[pos..];

        match escape.as_bytes().get(1..3).and_then(lookup) {
            Some(c) => {
                decoded.push(c);
                rest = &escape[3..];
            }
            None => {
                decoded.push('%');
                rest = &escape[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

fn lookup(hex: &[u8]) -> Option<char> {
    let upper = [hex[0].to_ascii_uppercase(), hex[1].to_ascii_uppercase()];
    ESCAPES.iter().find(|(code, _)| **code == upper).map(|(_, c)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_empty_str() {
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let query = parse_query("a=1&b=2&a=3");

        assert_eq!(query.len(), 2);
        assert_eq!(query["a"], "3");
        assert_eq!(query["b"], "2");
    }

    #[test]
    fn test_keys_without_value() {
        let query = parse_query("a&b&c=2");

        assert_eq!(query.len(), 3);
        assert_eq!(query["a"], "");
        assert_eq!(query["b"], "");
        assert_eq!(query["c"], "2");
    }

    #[test]
    fn test_empty_pairs_are_ignored() {
        let query = parse_query("a=1&&b=2&");
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_value_keeps_extra_equals() {
        let query = parse_query("expr=a=b");
        assert_eq!(query["expr"], "a=b");
    }

    #[test]
    fn test_decode_table() {
        assert_eq!(decode_component("hello%20world"), "hello world");
        assert_eq!(decode_component("a%2Fb%2fc"), "a/b/c");
        assert_eq!(decode_component("%3Cdiv%3E"), "<div>");
        assert_eq!(decode_component("name%3Dvalue%26x"), "name=value&x");
    }

    #[test]
    fn test_decode_is_single_pass() {
        assert_eq!(decode_component("%2520"), "%20");
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        assert_eq!(decode_component("caf%C3%A9"), "caf%C3%A9");
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%2"), "%2");
    }

    #[test]
    fn test_decoded_pairs() {
        let query = parse_query("q=rust%20lang&tag=%7Bx%7D");
        assert_eq!(query["q"], "rust lang");
        assert_eq!(query["tag"], "{x}");
    }
}
