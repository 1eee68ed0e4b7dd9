//! Panic recovery middleware

use crate::routing::{handler, middleware, Middleware};
use hyper::StatusCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Catch a panic from the wrapped handler, log it and answer 500
///
/// Anything the handler wrote before panicking is discarded.
pub fn recovery() -> Middleware {
    middleware(|next| {
        handler(move |ctx| {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| next(ctx))) {
                ctx.log_error(&format!(
                    "Handler panicked for {} {}: {}",
                    ctx.method(),
                    ctx.path(),
                    panic_message(payload.as_ref())
                ));
                ctx.writer().reset();
                let _ = ctx.string(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format_args!("500 Internal Server Error"),
                );
            }
        })
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
