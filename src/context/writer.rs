//! Buffered response writer
//!
//! Handlers write headers, a status and body bytes here; the engine turns the
//! result into a hyper `Response` once the handler chain has returned.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::io;

/// Response under construction for one request
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response headers, mutable until the response is flushed
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Record the status code
    ///
    /// Only the first call takes effect; returns `false` for a superfluous call.
    pub fn write_header(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        true
    }

    /// Set `Content-Type` unless one is already present
    pub fn set_content_type_if_absent(&mut self, value: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
    }

    /// Append body bytes; an unwritten status becomes 200
    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    /// Status written so far
    pub const fn written_status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Resolved status: the written one, or 200
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status or any body byte has been produced
    pub const fn is_written(&self) -> bool {
        self.status.is_some()
    }

    /// Take the buffered response, leaving an empty writer behind
    pub fn take_response(&mut self) -> Response<Full<Bytes>> {
        let writer = std::mem::take(self);
        let mut response = Response::new(Full::new(Bytes::from(writer.body)));
        *response.status_mut() = writer.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = writer.headers;
        response
    }

    /// Drop everything written so far
    pub fn reset(&mut self) {
        self.status = None;
        self.headers.clear();
        self.body.clear();
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
