//! Plain text and HTML views.

use crate::http::Response;
use crate::routing::error::BoxError;
use crate::views::View;

/// Appends UTF-8 text to the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextView {
    body: String,
    content_type: Option<&'static str>,
}

impl TextView {
    /// Text with no content type; serialization adds the charset attribute.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: Some("text/html"),
        }
    }
}

impl View for TextView {
    fn render(&self, response: &mut Response) -> Result<(), BoxError> {
        if let Some(content_type) = self.content_type {
            if response.header("content-type").is_none() {
                response.set_header("content-type", content_type);
            }
        }
        response.append_text(&self.body);
        Ok(())
    }
}
