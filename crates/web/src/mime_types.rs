//! File extension to content type lookup for static files.

use std::path::Path;

/// Content type of files whose extension is unknown or missing.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

static MIME_TYPES: &[(&str, &str)] = &[
    ("aac", "audio/aac"),
    ("avi", "video/x-msvideo"),
    ("bmp", "image/bmp"),
    ("bz", "application/x-bzip"),
    ("bz2", "application/x-bzip2"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/vnd.microsoft.icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("mid", "audio/midi"),
    ("midi", "audio/x-midi"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("rtf", "application/rtf"),
    ("sh", "application/x-sh"),
    ("svg", "image/svg+xml"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ts", "video/mp2t"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("wav", "audio/wav"),
    ("weba", "audio/webm"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xhtml", "application/xhtml+xml"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Looks up the content type of a file extension, given without the dot.
pub fn from_extension(extension: &str) -> &'static str {
    let extension = extension.to_ascii_lowercase();
    MIME_TYPES
        .binary_search_by(|(known, _)| known.cmp(&extension.as_str()))
        .map_or(DEFAULT_CONTENT_TYPE, |idx| MIME_TYPES[idx].1)
}

/// Content type of `path` derived from its extension.
pub fn from_path(path: impl AsRef<Path>) -> &'static str {
    path.as_ref().extension().and_then(|extension| extension.to_str()).map_or(DEFAULT_CONTENT_TYPE, from_extension)
}
