//! # currency-ffi
//!
//! Boundary between Rust and the native currency formatting library.
//!
//! - [`buffer`]: scoped native allocations, released exactly once on drop
//! - [`bridge`]: the [`CurrencyBridge`] request/response pair
//! - `icu`: the linked ICU backend (cargo feature `icu`)
//! - `stub`: scripted, allocation-tracking backend for tests (cargo feature `stub`)

pub mod bridge;
pub mod buffer;
#[cfg(feature = "icu")]
pub mod icu;
#[cfg(any(test, feature = "stub"))]
pub mod stub;

pub use bridge::CurrencyBridge;
pub use buffer::NativeBuf;
#[cfg(any(test, feature = "stub"))]
pub use stub::StubNative;
