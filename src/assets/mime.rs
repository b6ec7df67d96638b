//! Content-type lookup for site assets.
//!
//! Deterministic table keyed on the lowercase file extension. Anything not
//! listed maps to `None` so the object is declared without a content type
//! and the storage service / CDN applies its own default.

use std::path::Path;

/// Registered media types by name.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "text/javascript";
    pub const PLAIN: &str = "text/plain";
    pub const CSV: &str = "text/csv";
    pub const MARKDOWN: &str = "text/markdown";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MANIFEST: &str = "application/manifest+json";

    // Web feeds
    pub const RSS: &str = "application/rss+xml";
    pub const ATOM: &str = "application/atom+xml";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/vnd.microsoft.icon";
    pub const BMP: &str = "image/bmp";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";

    // Media
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/wav";
    pub const OGG: &str = "audio/ogg";
    pub const MP4: &str = "video/mp4";
    pub const WEBM: &str = "video/webm";

    // Binary
    pub const PDF: &str = "application/pdf";
    pub const WASM: &str = "application/wasm";
    pub const ZIP: &str = "application/zip";
    pub const GZIP: &str = "application/gzip";
}

pub fn content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    from_extension(&ext)
}

pub fn from_extension(ext: &str) -> Option<&'static str> {
    let ty = match ext {
        "html" | "htm" => types::HTML,
        "css" => types::CSS,
        "js" | "mjs" | "cjs" => types::JAVASCRIPT,
        "txt" => types::PLAIN,
        "csv" => types::CSV,
        "md" | "markdown" => types::MARKDOWN,
        "json" | "map" => types::JSON,
        "xml" => types::XML,
        "webmanifest" => types::MANIFEST,

        "rss" => types::RSS,
        "atom" => types::ATOM,

        "png" => types::PNG,
        "jpg" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,
        "svg" => types::SVG,
        "ico" => types::ICO,
        "bmp" => types::BMP,

        "woff" => types::WOFF,
        "woff2" => types::WOFF2,
        "ttf" => types::TTF,
        "otf" => types::OTF,

        "mp3" => types::MP3,
        "wav" => types::WAV,
        "ogg" | "oga" => types::OGG,
        "mp4" | "m4v" => types::MP4,
        "webm" => types::WEBM,

        "pdf" => types::PDF,
        "wasm" => types::WASM,
        "zip" => types::ZIP,
        "gz" => types::GZIP,

        _ => return None,
    };
    Some(ty)
}
