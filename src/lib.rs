//! sonata: a small HTTP framework with grouped routes and middleware
//!
//! Requests are matched against routes registered as `"/" + group + path`,
//! wrapped by group and route middleware, and answered through a [`Context`]
//! that renders HTML, templates, JSON, XML, plain text or redirects.
//!
//! ```no_run
//! use sonata::{middleware, Engine, StatusCode};
//!
//! # async fn run() -> sonata::Result<()> {
//! let mut engine = Engine::new();
//! let user = engine.group("user");
//! user.use_middleware(middleware::logging());
//! user.get("/info", |ctx| {
//!     let _ = ctx.string(StatusCode::OK, format_args!("hello"));
//! });
//! engine.run().await
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod pool;
pub mod render;
pub mod routing;
pub mod server;

pub use binding::{Bindable, Binding, Field, JsonBinding, Schema, Shape, XmlBinding};
pub use config::Config;
pub use context::Context;
pub use engine::Engine;
pub use error::{Error, Result};
pub use hyper::{Method, StatusCode};
pub use logger::{Level, Logger};
pub use render::{Render, TemplateSet};
pub use routing::{handler, HandlerFunc, Middleware, RouterGroup};
