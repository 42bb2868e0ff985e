//! Media processing module
//!
//! Maps an operation onto a fixed command template for the external tool.

mod error;
mod operation;
mod tool;

pub use error::MediaError;
pub use operation::{Operation, UnknownOperation};
pub use tool::{FfmpegTool, MediaTool};
