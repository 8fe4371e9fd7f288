//! HTTP request handlers for the web server.

mod api;
mod error;

pub use api::{api_extract, health};
pub use error::ApiError;
