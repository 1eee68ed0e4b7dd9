//! Access log format module
//!
//! Formatters turn one `LogFormatterParams` into one log line:
//! - `default_formatter` (`[sonata] time | status | latency | ip | method "path"`)
//! - `common_formatter` (Common Log Format - CLF)
//! - `json_formatter` (JSON structured logging)

use chrono::{DateTime, Local};
use std::net::IpAddr;
use std::time::Duration;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Everything the access log knows about one finished request
#[derive(Debug, Clone)]
pub struct LogFormatterParams {
    /// Time the handler chain returned
    pub time: DateTime<Local>,
    /// Response status code
    pub status: u16,
    /// Wall-clock time spent in the wrapped handler
    pub latency: Duration,
    /// Client IP address, if the peer address is known
    pub client_ip: Option<IpAddr>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path, with `?query` appended when present
    pub path: String,
    /// Emit ANSI colour codes
    pub is_display_color: bool,
}

impl LogFormatterParams {
    pub const fn status_code_color(&self) -> &'static str {
        match self.status {
            200 => GREEN,
            _ => RED,
        }
    }

    pub const fn reset_color(&self) -> &'static str {
        RESET
    }

    fn client_ip_string(&self) -> String {
        self.client_ip.map(|ip| ip.to_string()).unwrap_or_default()
    }

    fn latency_string(&self) -> String {
        let latency = if self.latency > Duration::from_secs(60) {
            Duration::from_secs(self.latency.as_secs())
        } else {
            self.latency
        };
        format!("{latency:?}")
    }
}

/// Default access log line, coloured when `is_display_color` is set
pub fn default_formatter(params: &LogFormatterParams) -> String {
    let time = params.time.format("%Y/%m/%d - %H:%M:%S");
    let latency = params.latency_string();
    let client_ip = params.client_ip_string();

    if params.is_display_color {
        let status_color = params.status_code_color();
        let reset = params.reset_color();
        return format!(
            "{YELLOW}[sonata]{reset} {BLUE}{time}{reset} |{status_color} {:>3} {reset}|{RED} {latency:>13} {reset}| {client_ip:>15} |{MAGENTA} {:<7}{reset} {CYAN}{:?}{reset}",
            params.status, params.method, params.path,
        );
    }

    format!(
        "[sonata] {time} | {:>3} | {latency:>13} | {client_ip:>15} | {:<7} {:?}",
        params.status, params.method, params.path,
    )
}

/// Common Log Format (CLF) without the byte count
/// `$remote_addr - - [$time_local] "$method $path" $status`
pub fn common_formatter(params: &LogFormatterParams) -> String {
    let client_ip = params.client_ip_string();
    format!(
        "{} - - [{}] \"{} {}\" {}",
        if client_ip.is_empty() { "-" } else { client_ip.as_str() },
        params.time.format("%d/%b/%Y:%H:%M:%S %z"),
        params.method,
        params.path,
        params.status,
    )
}

/// JSON structured log format
pub fn json_formatter(params: &LogFormatterParams) -> String {
    let line = serde_json::json!({
        "time": params.time.to_rfc3339(),
        "status": params.status,
        "latency_us": u64::try_from(params.latency.as_micros()).unwrap_or(u64::MAX),
        "client_ip": params.client_ip.map(|ip| ip.to_string()),
        "method": params.method,
        "path": params.path,
    });
    line.to_string()
}
