//! HTTP protocol layer module
//!
//! Response builders and MIME lookup, independent of the convert logic.

pub mod mime;
pub mod response;

// Re-export commonly used items
pub use response::{
    apply_common_headers, build_400_response, build_404_response, build_405_response,
    build_413_response, build_500_response, build_attachment_response,
    build_health_response, build_json_error_response, build_options_response, CONVERT_ALLOW,
    HEALTH_ALLOW,
};
