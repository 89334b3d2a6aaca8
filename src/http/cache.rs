//! HTTP cache control module
//!
//! Proxied data must always reach the upstream, so only the
//! non-caching policies exist here.

/// Cache control policy attached to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Revalidate before reuse
    NoCache,
    /// Never store, at any intermediary
    NoStore,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub const fn to_header_value(self) -> &'static str {
        match self {
            Self::NoCache => "no-cache",
            Self::NoStore => "no-store",
        }
    }
}
