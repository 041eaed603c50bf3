//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from object
//! lookup and streaming: header composition, cache validation, MIME detection
//! and response building.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::{is_not_modified, Validators};
pub use headers::{compose, HeaderSet};
pub use response::{build_500_response, build_response, empty_body, ResponseBody};
