//! Multipart form data for file uploads.
//!
//! A [`Form`] is built part by part. Adding a part can fail (a value that
//! does not encode, a reader that errors); the form then keeps the first
//! error, ignores later parts, and hands the error over to
//! [`PendingRequest::multipart_body`](crate::PendingRequest::multipart_body).
//!
//! # Example
//!
//! ```
//! use errand_core::{Form, Part};
//!
//! let form = Form::new()
//!     .part(Part::text("name", "John Doe"))
//!     .file("avatar", "photo.jpg", vec![0xFF, 0xD8]);
//!
//! let (content_type, _body) = form.into_body().expect("no deferred error");
//! assert!(content_type.starts_with("multipart/form-data; boundary="));
//! ```

use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};
use derive_more::{Display, Error};

use crate::BoxError;

/// Error recorded while building a [`Form`].
#[derive(Debug, Clone, Display, Error)]
#[display("multipart form error: {message}")]
pub struct FormError {
    message: String,
}

impl FormError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A single part in a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a new part with the given name and data.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Create a text part (`text/plain; charset=utf-8`).
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Bytes::from(value.into())).with_content_type("text/plain; charset=utf-8")
    }

    /// Create a file part; the content type is guessed from the extension.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename);
        Self::new(name, data)
            .with_filename(filename)
            .with_content_type(content_type)
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        _ => "application/octet-stream",
    }
}

/// A multipart form with a deferred error.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
    error: Option<FormError>,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create a new form with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
            error: None,
        }
    }

    /// Add a part to the form.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        if self.error.is_none() {
            self.parts.push(part);
        }
        self
    }

    /// Add a text field to the form.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Add a file to the form.
    #[must_use]
    pub fn file(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.part(Part::file(name, filename, data))
    }

    /// Add a file whose content is `value` encoded as JSON.
    #[must_use]
    pub fn json_file<T: serde::Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        value: &T,
    ) -> Self {
        self.encoded_file(name, filename, "application/json", || {
            crate::to_json(value).map_err(BoxError::from)
        })
    }

    /// Add a file produced by `encode`, sent with `content_type`.
    ///
    /// Covers formats without a dedicated helper, such as XML. An encoder
    /// error is kept as the form's deferred error.
    #[must_use]
    pub fn encoded_file(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        encode: impl FnOnce() -> Result<Bytes, BoxError>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        match encode() {
            Ok(data) => self.part(
                Part::new(name, data)
                    .with_filename(filename)
                    .with_content_type(content_type),
            ),
            Err(err) => self.fail(err.to_string()),
        }
    }

    /// Add a file whose content is copied from `reader`.
    #[must_use]
    pub fn reader_file(
        self,
        name: impl Into<String>,
        filename: impl Into<String>,
        mut reader: impl Read,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let mut data = Vec::new();
        match reader.read_to_end(&mut data) {
            Ok(_) => self.file(name, filename, data),
            Err(err) => self.fail(format!("failed to read file content: {err}")),
        }
    }

    fn fail(mut self, message: String) -> Self {
        if self.error.is_none() {
            self.error = Some(FormError::new(message));
        }
        self
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the parts in this form.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The first error recorded while building the form.
    #[must_use]
    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    /// Returns `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Convert the form into `(content-type header value, body bytes)`.
    pub fn into_body(self) -> Result<(String, Bytes), FormError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let content_type = self.content_type();
        let body = self.encode();
        Ok((content_type, body))
    }

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            buf.put_slice(part.name.as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(filename.as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    format!("----ErrandBoundary{timestamp:x}")
}
