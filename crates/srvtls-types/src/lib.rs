#![forbid(unsafe_code)]
#![doc = "Common error types and algorithm identifiers for srvtls."]

pub mod algorithm;
pub mod error;

pub use algorithm::*;
pub use error::*;
