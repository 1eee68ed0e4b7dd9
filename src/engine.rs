//! Engine: route table, shared resources and the per-request entry point

use crate::config::Config;
use crate::context::{Context, EngineRef};
use crate::error::Result;
use crate::http::{build_404_response, build_405_response};
use crate::logger::Logger;
use crate::pool::Pool;
use crate::render::TemplateSet;
use crate::routing::{match_route, HandlerFunc, RouteMatch, Router, RouterGroup};
use crate::server;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use minijinja::Environment;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Application entry point: owns the router, the templates, the logger and
/// the optional context pool
///
/// Routes and templates are registered through `&mut Engine`; once the engine
/// is shared for serving they are read-only.
pub struct Engine {
    router: Router,
    templates: Arc<TemplateSet>,
    logger: Arc<Logger>,
    pool: Option<Pool<Context>>,
    config: Config,
}

impl Engine {
    /// Engine with default configuration, logging to stdout/stderr
    pub fn new() -> Self {
        Self::build(Config::default(), Logger::default())
    }

    /// Engine configured from a loaded `Config`; fails if a log file cannot be opened
    pub fn with_config(config: Config) -> Result<Self> {
        let logger = Logger::from_config(&config.logging)?;
        Ok(Self::build(config, logger))
    }

    fn build(config: Config, logger: Logger) -> Self {
        let pool = config
            .engine
            .pool
            .then(|| Pool::new(config.engine.pool_capacity));
        Self {
            router: Router::new(),
            templates: Arc::new(TemplateSet::new()),
            logger: Arc::new(logger),
            pool,
            config,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = Arc::new(logger);
    }

    /// Create a route group served under `/<name>`
    pub fn group(&mut self, name: &str) -> &mut RouterGroup {
        self.router.group(name)
    }

    pub const fn router(&self) -> &Router {
        &self.router
    }

    // ---- templates ----

    /// Adjust the template environment, e.g. to register functions or filters
    pub fn configure_templates<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Environment<'static>),
    {
        f(Arc::make_mut(&mut self.templates).env_mut());
    }

    /// Load every template matching `pattern`, named by file name
    pub fn load_templates_glob(&mut self, pattern: &str) -> Result<usize> {
        let count = Arc::make_mut(&mut self.templates).parse_glob(pattern)?;
        self.logger
            .debug(&format!("Loaded {count} templates from {pattern}"));
        Ok(count)
    }

    pub fn load_template_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<()> {
        Arc::make_mut(&mut self.templates).parse_files(files)
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    // ---- serving ----

    /// Handle one buffered request and produce its response
    pub fn serve_http(
        &self,
        request: Request<Bytes>,
        remote_addr: Option<SocketAddr>,
    ) -> Response<Full<Bytes>> {
        let handler = match match_route(self.router.groups(), request.uri().path(), request.method()) {
            RouteMatch::Found(handler) => handler,
            RouteMatch::MethodNotAllowed => {
                return build_405_response(request_target(&request), request.method());
            }
            RouteMatch::NotFound => {
                return build_404_response(request_target(&request), request.method());
            }
        };

        let engine = EngineRef {
            templates: Arc::clone(&self.templates),
            logger: Arc::clone(&self.logger),
        };
        match &self.pool {
            Some(pool) => {
                let mut ctx = pool.acquire();
                dispatch(&mut ctx, &handler, request, remote_addr, engine)
            }
            None => {
                let mut ctx = Context::default();
                dispatch(&mut ctx, &handler, request, remote_addr, engine)
            }
        }
    }

    /// Bind the configured address and serve until SIGINT/SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = self.config.get_socket_addr()?;
        let listener = server::create_reusable_listener(addr)?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until SIGINT/SIGTERM
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        server::serve(Arc::new(self), listener, server::shutdown_signal()).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(
    ctx: &mut Context,
    handler: &HandlerFunc,
    request: Request<Bytes>,
    remote_addr: Option<SocketAddr>,
    engine: EngineRef,
) -> Response<Full<Bytes>> {
    ctx.bind(request, remote_addr, engine);
    handler(ctx);
    ctx.take_response()
}

/// Path and query as received, for miss messages
fn request_target(request: &Request<Bytes>) -> &str {
    request
        .uri()
        .path_and_query()
        .map_or("/", |target| target.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::logger::{Level, LogWriter};
    use crate::routing::{handler, middleware};
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;
    use hyper::{Method, StatusCode};
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Debug, Default, Deserialize, Serialize)]
    struct Login {
        user: String,
        #[serde(default)]
        remember: bool,
    }

    crate::schema!(Login { "user": required, "remember" });

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn engine(pool: bool) -> Engine {
        let config = Config {
            engine: EngineConfig {
                pool,
                pool_capacity: 4,
            },
            ..Config::default()
        };
        let mut engine = Engine::build(config, Logger::new(Level::Error, LogWriter::memory().0));
        let user = engine.group("user");
        user.get("/info", |ctx| {
            let id = ctx.default_query("id", "0").to_string();
            let _ = ctx.string(StatusCode::OK, format_args!("user {id}"));
        });
        user.post("/login", |ctx| {
            let mut login = Login::default();
            if ctx.bind_json(&mut login).is_ok() {
                let _ = ctx.json(StatusCode::OK, &login);
            }
        });
        engine
    }

    #[tokio::test]
    async fn test_dispatch_to_handler() {
        for pool in [true, false] {
            let engine = engine(pool);
            let response = engine.serve_http(request(Method::GET, "/user/info?id=7", ""), None);
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
            assert_eq!(body_text(response).await, "user 7");
        }
    }

    #[tokio::test]
    async fn test_misses() {
        let engine = engine(true);
        let response = engine.serve_http(request(Method::GET, "/user/nope?x=1", ""), None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "/user/nope?x=1 GET not found");

        let response = engine.serve_http(request(Method::PUT, "/user/info", ""), None);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_text(response).await, "/user/info PUT not allowed");
    }

    #[tokio::test]
    async fn test_binding_failure_is_400() {
        let engine = engine(true);
        let response = engine.serve_http(request(Method::POST, "/user/login", r#"{"remember":true}"#), None);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("user"));

        let response = engine.serve_http(request(Method::POST, "/user/login", r#"{"user":"ada"}"#), None);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"user":"ada","remember":false}"#);
    }

    #[tokio::test]
    async fn test_pooled_context_does_not_leak() {
        let engine = engine(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let mut engine = engine;
        engine.group("probe").get("/q", move |ctx| {
            s.lock()
                .unwrap()
                .push((ctx.get_query("k").map(str::to_string), ctx.remote_addr()));
        });

        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let _ = engine.serve_http(request(Method::GET, "/probe/q?k=secret", ""), Some(addr));
        let response = engine.serve_http(request(Method::GET, "/probe/q", ""), None);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *seen.lock().unwrap(),
            [(Some("secret".to_string()), Some(addr)), (None, None)]
        );
        assert_eq!(engine.pool.as_ref().unwrap().idle(), 1);
    }

    #[tokio::test]
    async fn test_templates_and_middleware() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.html"), "{{ shout(name) }}").unwrap();

        let mut engine = engine(true);
        engine.configure_templates(|env| {
            env.add_function("shout", |s: String| s.to_uppercase());
        });
        let pattern = format!("{}/*.html", dir.path().display());
        assert_eq!(engine.load_templates_glob(&pattern).unwrap(), 1);

        let page = engine.group("page");
        page.use_middleware(middleware(|next| {
            handler(move |ctx| {
                ctx.header("X-Group", "page");
                next(ctx);
            })
        }));
        page.get("/hello", |ctx| {
            let _ = ctx.html_template(StatusCode::OK, "hello.html", &serde_json::json!({ "name": "ada" }));
        });

        let response = engine.serve_http(request(Method::GET, "/page/hello", ""), None);
        assert_eq!(response.headers()["x-group"], "page");
        assert_eq!(body_text(response).await, "ADA");
    }

    #[test]
    fn test_bad_template_pattern_is_error() {
        let mut engine = Engine::new();
        assert!(engine.load_templates_glob("/nonexistent-dir/*.html").is_err());
    }
}
