//! Response rendering
//!
//! A `Render` is written in three steps, always in this order:
//! `write_content_type`, `write_header`, then `render` for the body.
//! `Redirect` skips the first two and sets `Location` and the status itself.

mod template;

pub use template::TemplateSet;

use crate::context::ResponseWriter;
use crate::error::{Error, Result};
use hyper::header::{HeaderValue, LOCATION};
use hyper::StatusCode;
use serde::Serialize;
use std::fmt;
use std::io::Write;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// One response body strategy, borrowing the data it renders
///
/// Variants without a data payload are written as `Render::<()>::Html(..)`.
pub enum Render<'a, T = ()> {
    /// Literal HTML
    Html(&'a str),
    /// Named template from the engine's template set
    HtmlTemplate { name: &'a str, data: &'a T },
    Json(&'a T),
    Xml(&'a T),
    /// Plain text, usually built with `format_args!`
    Text(fmt::Arguments<'a>),
    /// Redirect to `location`; status must be 3xx (300..=308) or 201
    Redirect { status: StatusCode, location: &'a str },
}

impl<T: Serialize> Render<'_, T> {
    const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Html(_) | Self::HtmlTemplate { .. } => Some(HTML_CONTENT_TYPE),
            Self::Json(_) => Some(JSON_CONTENT_TYPE),
            Self::Xml(_) => Some(XML_CONTENT_TYPE),
            Self::Text(_) => Some(TEXT_CONTENT_TYPE),
            Self::Redirect { .. } => None,
        }
    }

    /// Set `Content-Type` unless the handler already chose one
    pub fn write_content_type(&self, w: &mut ResponseWriter) {
        if let Some(content_type) = self.content_type() {
            w.set_content_type_if_absent(content_type);
        }
    }

    /// Write the status; returns `false` if a status had already been written
    pub fn write_header(&self, status: StatusCode, w: &mut ResponseWriter) -> bool {
        match self {
            Self::Redirect { .. } => true,
            _ => w.write_header(status),
        }
    }

    /// Write the body
    pub fn render(self, w: &mut ResponseWriter, templates: Option<&TemplateSet>) -> Result<()> {
        match self {
            Self::Html(html) => w.write_bytes(html.as_bytes()),
            Self::HtmlTemplate { name, data } => {
                templates.ok_or(Error::NoTemplates)?.execute(name, data, w)?;
            }
            Self::Json(data) => {
                let body = serde_json::to_vec(data)?;
                w.write_bytes(&body);
            }
            Self::Xml(data) => {
                let body = quick_xml::se::to_string(data).map_err(|e| Error::Xml(e.to_string()))?;
                w.write_bytes(body.as_bytes());
            }
            Self::Text(args) => w.write_fmt(args)?,
            Self::Redirect { status, location } => {
                if !is_redirect_status(status) {
                    return Err(Error::InvalidRedirectStatus(status.as_u16()));
                }
                let location = HeaderValue::from_str(location)
                    .map_err(|e| Error::InvalidHeader(format!("Location {location:?}: {e}")))?;
                w.headers_mut().insert(LOCATION, location);
                w.write_header(status);
            }
        }
        Ok(())
    }
}

/// Status codes a redirect may use: 300..=308, or 201 Created
pub fn is_redirect_status(status: StatusCode) -> bool {
    (300..=308).contains(&status.as_u16()) || status == StatusCode::CREATED
}
