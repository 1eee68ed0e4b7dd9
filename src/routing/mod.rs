//! Routing module
//!
//! Groups of exact-path routes, middleware composition and request matching:
//! - `RouterGroup` holds the per-path method tables of one `/<name>` prefix
//! - `Router` keeps groups in registration order
//! - `match_route` resolves a path and method to a composed handler

mod group;
mod matcher;

pub use group::{MethodKey, RouteHandle, RouterGroup};
pub use matcher::{compose, match_route, RouteMatch};

use crate::context::Context;
use std::sync::Arc;

/// Terminal request handler
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Handler-to-handler transformation wrapped around a route
pub type Middleware = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// Box a closure as a `HandlerFunc`
pub fn handler<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure as a `Middleware`
///
/// ```
/// use sonata::routing::middleware;
///
/// let timing = middleware(|next| {
///     sonata::routing::handler(move |ctx| {
///         let start = std::time::Instant::now();
///         next(ctx);
///         let _elapsed = start.elapsed();
///     })
/// });
/// # let _ = timing;
/// ```
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(HandlerFunc) -> HandlerFunc + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered collection of router groups
#[derive(Default)]
pub struct Router {
    groups: Vec<RouterGroup>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new group; groups are scanned in creation order
    pub fn group(&mut self, name: &str) -> &mut RouterGroup {
        self.groups.push(RouterGroup::new(name));
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    pub fn groups(&self) -> &[RouterGroup] {
        &self.groups
    }
}
