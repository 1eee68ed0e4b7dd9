//! Bundled middleware
//!
//! - `logging` writes one access log line per handled request
//! - `recovery` turns a panicking handler into a 500 response

mod logging;
pub(crate) mod recovery;

pub use logging::{logging, logging_with_config, LogFormatter, LoggingConfig};
pub use recovery::recovery;
