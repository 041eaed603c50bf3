//! Request handler module
//!
//! Connects hyper connections to the object server.

pub mod router;
pub mod writer;

// Re-export main entry point
pub use router::handle_request;
pub use writer::ChannelWriter;
