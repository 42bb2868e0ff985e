//! Request handler module
//!
//! Routing plus the single business endpoint, `POST /convert`.

pub mod convert;
mod error;
pub mod router;

pub use error::RequestError;
// Re-export main entry point
pub use router::handle_request;
