//! # Haqn Support
//!
//! Shared utilities for the Haqn DI framework.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - "Did you mean?" suggestions for unknown type names

pub mod rendering;
