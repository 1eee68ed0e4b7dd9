//! Access log middleware

use crate::logger::{default_formatter, LogFormatterParams, LogWriter};
use crate::routing::{handler, middleware, Middleware};
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

/// Turns the facts about one request into one log line
pub type LogFormatter = fn(&LogFormatterParams) -> String;

/// Options of the access log middleware
#[derive(Clone)]
pub struct LoggingConfig {
    pub formatter: LogFormatter,
    /// Destination of the lines; the engine logger's access target when `None`
    pub out: Option<Arc<LogWriter>>,
    /// Emit ANSI colours
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            formatter: default_formatter,
            out: None,
            color: false,
        }
    }
}

/// Access log middleware with the default formatter
pub fn logging() -> Middleware {
    logging_with_config(LoggingConfig::default())
}

/// Access log middleware measuring the latency of the wrapped handler
pub fn logging_with_config(config: LoggingConfig) -> Middleware {
    middleware(move |next| {
        let config = config.clone();
        handler(move |ctx| {
            let start = Instant::now();
            let path = match ctx.uri().query() {
                Some(query) => format!("{}?{query}", ctx.path()),
                None => ctx.path().to_string(),
            };

            next(ctx);

            let params = LogFormatterParams {
                time: Local::now(),
                status: ctx.status().as_u16(),
                latency: start.elapsed(),
                client_ip: ctx.client_ip(),
                method: ctx.method().to_string(),
                path,
                is_display_color: config.color,
            };
            let line = (config.formatter)(&params);
            match &config.out {
                Some(out) => out.write_access(&line),
                None => ctx.log_access(&line),
            }
        })
    })
}
