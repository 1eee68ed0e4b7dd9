//! HTTP protocol layer module
//!
//! Responses the engine and server produce on their own, outside of any handler.

pub mod response;

pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_text_response,
};
