//! # currency-core
//!
//! Core types, the native seam trait, configuration, and error handling for
//! the currency bridge.

pub mod config;
pub mod error;
pub mod native;

/// Capacity, in bytes, of the output buffer handed to every native call.
pub const BUF_SIZE_512: usize = 512;
