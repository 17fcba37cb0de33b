//! File-backed binary views.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::http::Response;
use crate::routing::error::BoxError;
use crate::views::View;

#[derive(Debug, Clone)]
enum Source {
    Disk(PathBuf),
    Loaded(Arc<[u8]>),
}

/// Serves file contents with binary framing.
#[derive(Debug, Clone)]
pub struct FileView {
    source: Source,
    content_type: String,
}

impl FileView {
    /// Read `path` when rendered; content type guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = content_type_for(&path).to_string();
        Self {
            source: Source::Disk(path),
            content_type,
        }
    }

    pub fn from_bytes(data: Arc<[u8]>, content_type: &str) -> Self {
        Self {
            source: Source::Loaded(data),
            content_type: content_type.to_string(),
        }
    }
}

impl View for FileView {
    fn render(&self, response: &mut Response) -> Result<(), BoxError> {
        match &self.source {
            Source::Disk(path) => {
                let data = std::fs::read(path)?;
                response.append_body(&data);
            }
            Source::Loaded(data) => response.append_body(data),
        }
        response.set_binary(true);
        if response.header("content-type").is_none() {
            response.set_header("content-type", self.content_type.as_str());
        }
        Ok(())
    }
}

/// Guess a media type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "text/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
