//! Router groups
//!
//! A group owns every route registered under `/<name>` and the middleware
//! shared by all of them. Groups are filled during setup and only read while
//! serving.

use super::{HandlerFunc, Middleware};
use crate::context::Context;
use hyper::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Method a route answers: one HTTP method, or any of them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodKey {
    Any,
    Exact(Method),
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Exact(method) => write!(f, "{method}"),
        }
    }
}

/// Handler plus the middleware registered for this (path, method) only
#[derive(Clone)]
pub struct Route {
    pub(crate) handler: HandlerFunc,
    pub(crate) middlewares: Vec<Middleware>,
}

/// Routes registered under one path, by method
pub type MethodTable = HashMap<MethodKey, Route>;

/// Named collection of routes sharing a URL prefix and a middleware stack
pub struct RouterGroup {
    name: String,
    paths: HashMap<String, MethodTable>,
    middlewares: Vec<Middleware>,
}

impl RouterGroup {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            paths: HashMap::new(),
            middlewares: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full request path of a route registered as `path` in this group
    pub fn full_path(&self, path: &str) -> String {
        format!("/{}{path}", self.name)
    }

    /// Append group middleware; it wraps every route of the group, including
    /// routes registered before this call
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    pub(crate) fn method_table(&self, path: &str) -> Option<&MethodTable> {
        self.paths.get(path)
    }

    /// Number of (path, method) registrations
    pub fn route_count(&self) -> usize {
        self.paths.values().map(HashMap::len).sum()
    }

    /// Register `handler` for `method` under `path`
    ///
    /// # Panics
    ///
    /// Panics if this group already has a handler for (`path`, `method`).
    pub fn handle<F>(&mut self, method: MethodKey, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        let full_path = self.full_path(path);
        let table = self.paths.entry(path.to_string()).or_default();
        assert!(
            !table.contains_key(&method),
            "route already registered: {method} {full_path}"
        );
        let route = table.entry(method).or_insert(Route {
            handler: Arc::new(handler),
            middlewares: Vec::new(),
        });
        RouteHandle { route }
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Exact(Method::GET), path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Exact(Method::POST), path, handler)
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Exact(Method::PUT), path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Exact(Method::DELETE), path, handler)
    }

    pub fn patch<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Exact(Method::PATCH), path, handler)
    }

    /// Register `handler` for every method; it takes precedence over
    /// method-specific handlers of the same path
    pub fn any<F>(&mut self, path: &str, handler: F) -> RouteHandle<'_>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(MethodKey::Any, path, handler)
    }
}

/// Handle to a freshly registered route, for attaching route middleware
pub struct RouteHandle<'a> {
    route: &'a mut Route,
}

impl RouteHandle<'_> {
    /// Append route middleware; runs inside the group middleware, outside the handler
    #[allow(clippy::return_self_not_must_use)]
    pub fn with(self, middleware: Middleware) -> Self {
        self.route.middlewares.push(middleware);
        self
    }
}
