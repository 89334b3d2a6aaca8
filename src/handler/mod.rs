//! Request handler module
//!
//! Routes inbound requests to the chat and storage proxies.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
