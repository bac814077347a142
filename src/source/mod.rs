//! Ancestor sources for lazy expansion.
//!
//! - [`AncestorSource`] - the async seam the fetcher talks to
//! - [`HttpAncestorSource`] - the site's expand endpoint over HTTP
//! - [`MemoryAncestorSource`] - answers from a dataset held in memory

mod http;
mod memory;
mod traits;

pub use http::HttpAncestorSource;
pub use memory::MemoryAncestorSource;
pub use traits::AncestorSource;
