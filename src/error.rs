//! Error types
//!
//! Request-time failures (binding, rendering, form parsing) and setup-time
//! failures (template loading, configuration) share one error enum.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the framework
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("invalid template pattern: {0}")]
    TemplatePattern(#[from] glob::PatternError),

    /// A named template was requested but no template set is loaded
    #[error("no HTML templates loaded")]
    NoTemplates,

    /// A field marked as required is absent (or null) in the request body
    #[error("field [{0}] is not exist")]
    MissingField(String),

    /// Strict binding found a key the destination does not declare
    #[error("unknown field [{0}]")]
    UnknownField(String),

    #[error("invalid request: empty body")]
    EmptyBody,

    #[error("cannot redirect with status code {0}")]
    InvalidRedirectStatus(u16),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("form parse error: {0}")]
    Form(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<multer::Error> for Error {
    fn from(err: multer::Error) -> Self {
        Self::Form(err.to_string())
    }
}
