//! HTTP protocol layer module
//!
//! Response builders, cache validators and Range parsing, independent of the
//! image-hosting handlers that use them.

pub mod cache;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use response::{
    build_304_response, build_400_response, build_404_response, build_405_response,
    build_413_response, build_416_response, build_500_response, build_html_response,
    build_redirect_response,
};
