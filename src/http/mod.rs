//! HTTP protocol layer module
//!
//! Response builders and cache headers, decoupled from the proxy logic.

pub mod cache;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use response::{
    build_400_response, build_404_response, build_413_response, build_health_response, build_proxy_response,
    set_server_header,
};
