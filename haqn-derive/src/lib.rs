//! Derive macros for Haqn DI.
//!
//! Re-exported by the `haqn` crate; depend on that instead.

pub use haqn_macros::Injectable;
