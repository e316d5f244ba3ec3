//! Command Bridge helpers.
//!
//! Pure lookup/normalization logic behind the synchronous host imports. The
//! wiring into the linker lives in `crate::runtime::imports`; this module
//! keeps the parts worth testing on their own.

pub mod cursor;
pub mod mouse;
