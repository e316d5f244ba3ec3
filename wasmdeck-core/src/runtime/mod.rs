//! Wasmtime-backed runtime glue.
//!
//! - `runtime`: engine/store/linker construction and instantiation.
//! - `imports`: the Command Bridge, every host function the guest can call.

pub mod imports;
mod runtime;

pub use runtime::Runtime;
