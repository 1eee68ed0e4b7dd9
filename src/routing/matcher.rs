//! Route matching module
//!
//! Resolves a request path and method against the router's groups and
//! builds the middleware chain of the matched route.

use super::group::{MethodKey, Route, RouterGroup};
use super::{HandlerFunc, Middleware};
use hyper::Method;

/// Outcome of matching one request
pub enum RouteMatch {
    /// Handler already wrapped by its group and route middleware
    Found(HandlerFunc),
    /// Some group owns the path, but not for this method
    MethodNotAllowed,
    NotFound,
}

impl RouteMatch {
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Find the route for `path` and `method`
///
/// Groups are scanned in order. A route registered as `path` in group `name`
/// matches the request path `"/" + name + path` exactly. The first group that
/// owns the path decides the outcome; an any-method handler wins over the
/// exact-method one.
///
/// `path` is the URI path without the query string, so `/user/info?id=7`
/// matches `/user/info`. Comparing the full request target instead would make
/// every route with a query a 404 and leave the query accessors unreachable.
pub fn match_route(groups: &[RouterGroup], path: &str, method: &Method) -> RouteMatch {
    for group in groups {
        let Some(table) = path
            .strip_prefix('/')
            .and_then(|rest| rest.strip_prefix(group.name()))
            .and_then(|suffix| group.method_table(suffix))
        else {
            continue;
        };

        let route = table
            .get(&MethodKey::Any)
            .or_else(|| table.get(&MethodKey::Exact(method.clone())));
        return match route {
            Some(route) => RouteMatch::Found(chain(group, route)),
            None => RouteMatch::MethodNotAllowed,
        };
    }
    RouteMatch::NotFound
}

fn chain(group: &RouterGroup, route: &Route) -> HandlerFunc {
    let inner = compose(route.handler.clone(), &route.middlewares);
    compose(inner, group.middlewares())
}

/// Wrap `handler` so that `middlewares[0]` runs outermost
pub fn compose(handler: HandlerFunc, middlewares: &[Middleware]) -> HandlerFunc {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware(next))
}
