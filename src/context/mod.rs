//! Per-request context
//!
//! A `Context` carries the request, the response under construction, and
//! values derived lazily from the request (query and form caches). Contexts
//! may be recycled through a pool; `Reset` drops everything request-specific.

pub mod params;
mod writer;

pub use params::{Values, MAX_FORM_SIZE};
pub use writer::ResponseWriter;

use crate::binding::{Bindable, Binding, JsonBinding, XmlBinding};
use crate::error::Result;
use crate::logger::Logger;
use crate::pool::Reset;
use crate::render::{Render, TemplateSet};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, Request, StatusCode, Uri};
use serde::Serialize;
use std::cell::OnceCell;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

/// Read-only engine state a context may consult while handling a request
#[derive(Clone)]
pub(crate) struct EngineRef {
    pub templates: Arc<TemplateSet>,
    pub logger: Arc<Logger>,
}

/// State of one in-flight request
#[derive(Default)]
pub struct Context {
    request: Request<Bytes>,
    remote_addr: Option<SocketAddr>,
    writer: ResponseWriter,
    engine: Option<EngineRef>,
    query_cache: OnceCell<Values>,
    form_cache: OnceCell<Values>,
}

impl Context {
    /// Standalone context for a buffered request, outside of any engine
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub(crate) fn bind(
        &mut self,
        request: Request<Bytes>,
        remote_addr: Option<SocketAddr>,
        engine: EngineRef,
    ) {
        self.request = request;
        self.remote_addr = remote_addr;
        self.engine = Some(engine);
    }

    pub(crate) fn take_response(&mut self) -> hyper::Response<http_body_util::Full<Bytes>> {
        self.writer.take_response()
    }

    // ---- request ----

    pub const fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// IP address of the peer that sent the request
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }

    // ---- response ----

    pub fn writer(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Set a response header; invalid names or values are logged and skipped
    pub fn header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.writer.headers_mut().insert(name, value);
            }
            _ => self.log_warn(&format!("Invalid response header: {name}: {value}")),
        }
    }

    /// Status the response carries so far (200 if nothing was written)
    pub fn status(&self) -> StatusCode {
        self.writer.status()
    }

    // ---- query ----

    fn query_values(&self) -> &Values {
        self.query_cache
            .get_or_init(|| params::parse_query(self.request.uri().query()))
    }

    /// First value of a query parameter
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.get_query_array(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a query parameter, in order of appearance
    pub fn get_query_array(&self, key: &str) -> Option<&[String]> {
        self.query_values().get(key).map(Vec::as_slice)
    }

    pub fn default_query<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_query(key).unwrap_or(default)
    }

    // ---- form ----

    fn form_values(&self) -> &Values {
        self.form_cache.get_or_init(|| {
            params::parse_form(self.request.method(), self.request.headers(), self.request.body())
                .unwrap_or_else(|e| {
                    self.log_error(&format!("Failed to parse form body: {e}"));
                    Values::new()
                })
        })
    }

    /// First value of a form field
    pub fn get_post_form(&self, key: &str) -> Option<&str> {
        self.get_post_form_array(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a form field, in order of appearance
    pub fn get_post_form_array(&self, key: &str) -> Option<&[String]> {
        self.form_values().get(key).map(Vec::as_slice)
    }

    pub fn default_post_form<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_post_form(key).unwrap_or(default)
    }

    // ---- binding ----

    /// Decode the body with `binding`, leaving the response untouched on failure
    pub fn should_bind_with<B: Binding, T: Bindable>(&self, binding: &B, dest: &mut T) -> Result<()> {
        binding.bind(self.request.body(), dest)
    }

    /// Decode the body with `binding`; on failure answer 400 with the error text
    pub fn bind_with<B: Binding, T: Bindable>(&mut self, binding: &B, dest: &mut T) -> Result<()> {
        if let Err(e) = self.should_bind_with(binding, dest) {
            self.log_debug(&format!("{} binding failed: {e}", binding.name()));
            // The bind error is what the caller needs; a failed 400 write is only logged.
            let _ = self.string(StatusCode::BAD_REQUEST, format_args!("{e}"));
            return Err(e);
        }
        Ok(())
    }

    /// JSON binding with required-field validation
    pub fn bind_json<T: Bindable>(&mut self, dest: &mut T) -> Result<()> {
        self.bind_with(&JsonBinding::new(), dest)
    }

    pub fn bind_xml<T: Bindable>(&mut self, dest: &mut T) -> Result<()> {
        self.bind_with(&XmlBinding, dest)
    }

    // ---- rendering ----

    /// Write a response with the given status and body strategy
    pub fn render<T: Serialize>(&mut self, status: StatusCode, r: Render<'_, T>) -> Result<()> {
        let templates = self.engine.as_ref().map(|engine| Arc::clone(&engine.templates));
        self.render_with(status, r, templates.as_deref())
    }

    fn render_with<T: Serialize>(
        &mut self,
        status: StatusCode,
        r: Render<'_, T>,
        templates: Option<&TemplateSet>,
    ) -> Result<()> {
        r.write_content_type(&mut self.writer);
        if !r.write_header(status, &mut self.writer) {
            self.log_warn(&format!(
                "Superfluous status {status} for {}: {} already written",
                self.path(),
                self.writer.status()
            ));
        }
        r.render(&mut self.writer, templates).map_err(|e| {
            self.log_error(&format!("Render failed for {}: {e}", self.path()));
            e
        })
    }

    pub fn html(&mut self, status: StatusCode, html: &str) -> Result<()> {
        self.render(status, Render::<()>::Html(html))
    }

    /// Execute a template loaded into the engine
    pub fn html_template<T: Serialize>(&mut self, status: StatusCode, name: &str, data: &T) -> Result<()> {
        self.render(status, Render::HtmlTemplate { name, data })
    }

    /// Execute a template from the engine without writing a status first
    pub fn template<T: Serialize>(&mut self, name: &str, data: &T) -> Result<()> {
        let templates = self.engine.as_ref().map(|engine| Arc::clone(&engine.templates));
        let r = Render::HtmlTemplate { name, data };
        r.write_content_type(&mut self.writer);
        r.render(&mut self.writer, templates.as_deref())
    }

    /// Parse `files` for this call only and execute `name` from them
    pub fn html_template_files<T, P>(
        &mut self,
        status: StatusCode,
        name: &str,
        data: &T,
        files: &[P],
    ) -> Result<()>
    where
        T: Serialize,
        P: AsRef<Path>,
    {
        let mut set = TemplateSet::new();
        set.parse_files(files)?;
        self.render_with(status, Render::HtmlTemplate { name, data }, Some(&set))
    }

    /// Parse the files matching `pattern` for this call only and execute `name`
    pub fn html_template_glob<T: Serialize>(
        &mut self,
        status: StatusCode,
        name: &str,
        data: &T,
        pattern: &str,
    ) -> Result<()> {
        let mut set = TemplateSet::new();
        set.parse_glob(pattern)?;
        self.render_with(status, Render::HtmlTemplate { name, data }, Some(&set))
    }

    pub fn json<T: Serialize>(&mut self, status: StatusCode, data: &T) -> Result<()> {
        self.render(status, Render::Json(data))
    }

    pub fn xml<T: Serialize>(&mut self, status: StatusCode, data: &T) -> Result<()> {
        self.render(status, Render::Xml(data))
    }

    /// Plain text response, e.g. `ctx.string(StatusCode::OK, format_args!("hi {name}"))`
    pub fn string(&mut self, status: StatusCode, text: fmt::Arguments<'_>) -> Result<()> {
        self.render(status, Render::<()>::Text(text))
    }

    /// Redirect to `location`; `status` must be 300..=308 or 201
    pub fn redirect(&mut self, status: StatusCode, location: &str) -> Result<()> {
        let r: Render<'_> = Render::Redirect { status, location };
        self.render(status, r)
    }

    // ---- logging ----

    fn logger(&self) -> Option<&Logger> {
        self.engine.as_ref().map(|engine| engine.logger.as_ref())
    }

    pub(crate) fn log_debug(&self, message: &str) {
        if let Some(logger) = self.logger() {
            logger.debug(message);
        }
    }

    pub(crate) fn log_warn(&self, message: &str) {
        if let Some(logger) = self.logger() {
            logger.warn(message);
        }
    }

    pub(crate) fn log_error(&self, message: &str) {
        if let Some(logger) = self.logger() {
            logger.error(message);
        }
    }

    /// Write an access log line through the engine's logger
    pub fn log_access(&self, line: &str) {
        if let Some(logger) = self.logger() {
            logger.access(line);
        }
    }
}

impl Reset for Context {
    fn reset(&mut self) {
        self.request = Request::default();
        self.remote_addr = None;
        self.writer.reset();
        self.engine = None;
        self.query_cache.take();
        self.form_cache.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{Level, LogWriter};
    use hyper::header::{CONTENT_TYPE, LOCATION};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
    struct User {
        name: String,
        #[serde(default)]
        age: u32,
    }

    crate::schema!(User { "name": required, "age" });

    fn request(method: Method, uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Bytes> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[test]
    fn test_query_access() {
        let ctx = Context::new(request(Method::GET, "/user/info?id=7&tag=a&tag=b", None, ""));
        assert_eq!(ctx.get_query("id"), Some("7"));
        assert_eq!(ctx.get_query_array("tag").unwrap(), ["a", "b"]);
        assert_eq!(ctx.get_query("missing"), None);
        assert_eq!(ctx.default_query("page", "1"), "1");
        assert_eq!(ctx.default_query("id", "1"), "7");
    }

    #[test]
    fn test_form_access() {
        let ctx = Context::new(request(
            Method::POST,
            "/user/login",
            Some("application/x-www-form-urlencoded"),
            "user=ada&role=a&role=b",
        ));
        assert_eq!(ctx.get_post_form("user"), Some("ada"));
        assert_eq!(ctx.get_post_form_array("role").unwrap(), ["a", "b"]);
        assert_eq!(ctx.default_post_form("lang", "en"), "en");
    }

    #[test]
    fn test_bad_form_is_logged_not_fatal() {
        let (writer, log) = LogWriter::memory();
        let engine = EngineRef {
            templates: Arc::new(TemplateSet::new()),
            logger: Arc::new(Logger::new(Level::Debug, writer)),
        };
        let mut ctx = Context::default();
        ctx.bind(
            request(Method::POST, "/up", Some("multipart/form-data"), "junk"),
            None,
            engine,
        );
        assert_eq!(ctx.get_post_form("user"), None);
        assert!(log.contents().contains("Failed to parse form body"));
    }

    #[test]
    fn test_oversized_form_is_empty_and_logged() {
        let (writer, log) = LogWriter::memory();
        let engine = EngineRef {
            templates: Arc::new(TemplateSet::new()),
            logger: Arc::new(Logger::new(Level::Debug, writer)),
        };
        let mut body = b"user=ada&pad=".to_vec();
        body.resize(usize::try_from(MAX_FORM_SIZE).unwrap() + 1, b'x');
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Bytes::from(body))
            .unwrap();
        let mut ctx = Context::default();
        ctx.bind(request, None, engine);

        assert_eq!(ctx.get_post_form("user"), None);
        assert_eq!(ctx.default_post_form("user", "none"), "none");
        assert!(log.contents().contains("request body too large"));
    }

    #[test]
    fn test_bind_json_missing_field_answers_400() {
        let mut ctx = Context::new(request(Method::POST, "/user", None, r#"{"age": 3}"#));
        let mut user = User::default();
        let err = ctx.bind_json(&mut user).unwrap_err();
        assert!(err.to_string().contains("name"));
        assert_eq!(ctx.status(), StatusCode::BAD_REQUEST);
        assert!(String::from_utf8_lossy(ctx.writer().body()).contains("name"));
    }

    #[test]
    fn test_bind_json_success() {
        let mut ctx = Context::new(request(Method::POST, "/user", None, r#"{"name": "ada", "age": 3}"#));
        let mut user = User::default();
        ctx.bind_json(&mut user).unwrap();
        assert_eq!(user.name, "ada");
        assert!(!ctx.writer().is_written());
    }

    #[test]
    fn test_should_bind_leaves_response() {
        let ctx = Context::new(request(Method::POST, "/user", None, "{}"));
        let mut user = User::default();
        assert!(ctx.should_bind_with(&JsonBinding::new(), &mut user).is_err());
        assert!(!ctx.writer.is_written());
    }

    #[test]
    fn test_render_helpers() {
        let mut ctx = Context::new(Request::default());
        ctx.json(StatusCode::CREATED, &User { name: "ada".into(), age: 1 })
            .unwrap();
        assert_eq!(ctx.status(), StatusCode::CREATED);
        assert_eq!(ctx.writer().headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(ctx.writer().body(), br#"{"name":"ada","age":1}"#);
    }

    #[test]
    fn test_redirect() {
        let mut ctx = Context::new(Request::default());
        assert!(ctx.redirect(StatusCode::OK, "/home").is_err());
        ctx.redirect(StatusCode::FOUND, "/home").unwrap();
        assert_eq!(ctx.status(), StatusCode::FOUND);
        assert_eq!(ctx.writer().headers()[LOCATION], "/home");
    }

    #[test]
    fn test_template_from_engine() {
        let mut templates = TemplateSet::new();
        templates.add_template("hi.html", "hi {{ name }}").unwrap();
        let mut ctx = Context::default();
        ctx.bind(
            Request::default(),
            None,
            EngineRef {
                templates: Arc::new(templates),
                logger: Arc::new(Logger::new(Level::Error, LogWriter::memory().0)),
            },
        );
        ctx.html_template(StatusCode::OK, "hi.html", &serde_json::json!({ "name": "ada" }))
            .unwrap();
        assert_eq!(ctx.writer().body(), b"hi ada");
        assert_eq!(ctx.writer().headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[test]
    fn test_template_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.html");
        std::fs::write(&path, "<p>{{ n }}</p>").unwrap();
        let mut ctx = Context::new(Request::default());
        ctx.html_template_files(StatusCode::OK, "card.html", &serde_json::json!({ "n": 5 }), &[&path])
            .unwrap();
        assert_eq!(ctx.writer().body(), b"<p>5</p>");

        let mut ctx = Context::new(Request::default());
        let pattern = format!("{}/*.html", dir.path().display());
        ctx.html_template_glob(StatusCode::OK, "card.html", &serde_json::json!({ "n": 6 }), &pattern)
            .unwrap();
        assert_eq!(ctx.writer().body(), b"<p>6</p>");
    }

    #[test]
    fn test_reset_clears_request_state() {
        let mut ctx = Context::new(request(Method::GET, "/a?x=1", None, "body"));
        ctx.remote_addr = Some("127.0.0.1:9000".parse().unwrap());
        assert_eq!(ctx.get_query("x"), Some("1"));
        ctx.string(StatusCode::OK, format_args!("hello")).unwrap();

        ctx.reset();
        assert_eq!(ctx.path(), "/");
        assert!(ctx.body().is_empty());
        assert!(ctx.remote_addr().is_none());
        assert!(!ctx.writer().is_written());
        assert_eq!(ctx.get_query("x"), None);
    }
}
