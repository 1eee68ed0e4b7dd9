//! Query string and form body parsing
//!
//! Both produce `Values`: parameter name to every value, in order of appearance.

use crate::error::{Error, Result};
use futures::stream;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONTENT_TYPE};
use hyper::Method;
use std::collections::HashMap;

/// Parameter name to ordered values
pub type Values = HashMap<String, Vec<String>>;

/// Largest body the form parser accepts (32 MiB)
pub const MAX_FORM_SIZE: u64 = 32 << 20;

const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parse a raw query string (without the leading `?`)
pub fn parse_query(query: Option<&str>) -> Values {
    let mut values = Values::new();
    if let Some(query) = query {
        collect_urlencoded(query.as_bytes(), &mut values);
    }
    values
}

/// Parse the form fields carried by a request body
///
/// Only POST, PUT and PATCH bodies are read. A body that is neither
/// urlencoded nor multipart yields no values and no error.
pub fn parse_form(method: &Method, headers: &HeaderMap, body: &Bytes) -> Result<Values> {
    let mut values = Values::new();
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return Ok(values);
    }
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return Ok(values);
    };
    if body.len() as u64 > MAX_FORM_SIZE {
        return Err(Error::Form(format!(
            "request body too large: {} bytes (max: {MAX_FORM_SIZE})",
            body.len()
        )));
    }

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(URLENCODED) {
        collect_urlencoded(body, &mut values);
        return Ok(values);
    }

    match multer::parse_boundary(content_type) {
        Ok(boundary) => parse_multipart(body.clone(), boundary),
        Err(multer::Error::NoMultipart) => Ok(values),
        Err(e) => Err(e.into()),
    }
}

fn collect_urlencoded(input: &[u8], values: &mut Values) {
    for (key, value) in url::form_urlencoded::parse(input) {
        values
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
}

/// Read the text fields of a multipart body; file parts are skipped
fn parse_multipart(body: Bytes, boundary: String) -> Result<Values> {
    let source = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(MAX_FORM_SIZE));
    let mut multipart = multer::Multipart::with_constraints(source, boundary, constraints);

    // The body is already in memory, so the stream never waits.
    futures::executor::block_on(async move {
        let mut values = Values::new();
        while let Some(field) = multipart.next_field().await? {
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let text = field.text().await?;
            values.entry(name).or_default().push(text);
        }
        Ok(values)
    })
}
