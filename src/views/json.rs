//! JSON view.

use serde::Serialize;

use crate::http::Response;
use crate::routing::error::BoxError;
use crate::views::View;

/// A value serialized with `serde_json` when the view is built.
#[derive(Debug, Clone)]
pub struct JsonView {
    body: Vec<u8>,
}

impl JsonView {
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            body: serde_json::to_vec(value)?,
        })
    }
}

impl View for JsonView {
    fn render(&self, response: &mut Response) -> Result<(), BoxError> {
        response.set_header("content-type", "application/json");
        response.append_body(&self.body);
        Ok(())
    }
}
