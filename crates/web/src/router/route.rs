//! Route patterns and path matching.
//!
//! A pattern such as `/users/:id` or `/files/img:a:rest` is compiled once into a list
//! of [`Segment`]s. Each `/`-delimited part of the pattern is either a literal, or a
//! parameter block: an optional literal prefix followed by one or more `:name`s.
//!
//! When a parameter block matches a request segment, every name but the last takes
//! exactly one character of what follows the prefix, and the last takes the rest:
//!
//! ```
//! use mote_web::router::CompiledRoute;
//!
//! let route = CompiledRoute::compile("/v:major:minor");
//! let segments = vec!["v1beta".to_owned()];
//! let params = route.matches(&segments, true).unwrap();
//!
//! assert_eq!(params["major"], "1");
//! assert_eq!(params["minor"], "beta");
//! ```

use std::collections::HashMap;

/// One compiled component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Captures parameters from a request segment starting with `prefix`.
    Param { prefix: String, names: Vec<String> },
}

impl Segment {
    fn parse(part: &str) -> Self {
        let mut pieces = part.split(':');
        // `split` always yields at least one piece
        let prefix = pieces.next().unwrap_or_default();
        let names: Vec<String> = pieces.map(str::to_owned).collect();

        if names.is_empty() { Segment::Literal(prefix.to_owned()) } else { Segment::Param { prefix: prefix.to_owned(), names } }
    }

    fn capture(&self, request_segment: &str, params: &mut HashMap<String, String>) -> bool {
        match self {
            Segment::Literal(text) => text == request_segment,
            Segment::Param { prefix, names } => {
                let Some(rest) = request_segment.strip_prefix(prefix.as_str()) else {
                    return false;
                };
                let Some((last, singles)) = names.split_last() else {
                    return false;
                };
                if rest.chars().count() < names.len() {
                    return false;
                }

                let mut chars = rest.chars();
                for name in singles {
                    if let Some(c) = chars.next() {
                        params.insert(name.clone(), c.to_string());
                    }
                }
                params.insert(last.clone(), chars.as_str().to_owned());
                true
            }
        }
    }
}

/// A route pattern compiled into its segments, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    pattern: String,
    segments: Vec<Segment>,
}

impl CompiledRoute {
    /// Compiles `pattern` after lower-casing it. Empty parts are dropped, so `/`
    /// compiles to no segments at all. Compilation never fails.
    pub fn compile(pattern: &str) -> Self {
        let pattern = pattern.to_lowercase();
        let segments = pattern.split('/').filter(|part| !part.is_empty()).map(Segment::parse).collect();
        Self { pattern, segments }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches the request path segments, returning the captured parameters.
    ///
    /// With `exact` the segment counts must be equal, otherwise the route only has to
    /// be a prefix of the request path.
    pub fn matches(&self, request_segments: &[String], exact: bool) -> Option<HashMap<String, String>> {
        if request_segments.len() < self.segments.len() {
            return None;
        }
        if exact && request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, request_segment) in self.segments.iter().zip(request_segments) {
            if !segment.capture(request_segment, &mut params) {
                return None;
            }
        }
        Some(params)
    }
}
