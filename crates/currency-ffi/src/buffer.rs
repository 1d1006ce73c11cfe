//! Scoped native allocations.
//!
//! A [`NativeBuf`] owns one block obtained from a [`NativeCurrency`]
//! allocator and hands it back to the same allocator when dropped, so every
//! exit path of a boundary call (success, native failure, early `?`) releases
//! it exactly once.

use std::ptr::{self, NonNull};

use currency_core::{error::CurrencyError, native::NativeCurrency};
use libc::c_char;

/// Native memory block owned by one boundary call.
pub struct NativeBuf<'n, N: NativeCurrency + ?Sized> {
    native: &'n N,
    ptr: NonNull<c_char>,
    len: usize,
}

impl<'n, N: NativeCurrency + ?Sized> NativeBuf<'n, N> {
    /// Allocate a zero-filled block of `len` bytes.
    pub fn alloc(native: &'n N, len: usize) -> Result<Self, CurrencyError> {
        let raw = native.alloc(len).cast::<c_char>();
        let ptr = NonNull::new(raw).ok_or(CurrencyError::Alloc { size: len })?;
        // SAFETY: `ptr` is a fresh allocation of `len` bytes.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Ok(Self { native, ptr, len })
    }

    /// Copy `s` into a NUL-terminated native string.
    pub fn copy_str(native: &'n N, s: &str) -> Result<Self, CurrencyError> {
        if s.as_bytes().contains(&0) {
            return Err(CurrencyError::InvalidArgument(format!(
                "argument contains an interior nul byte: {s:?}"
            )));
        }
        // Zero-filled, so the terminator is already in place.
        let buf = Self::alloc(native, s.len() + 1)?;
        // SAFETY: the block holds `s.len() + 1` bytes and does not overlap `s`.
        unsafe { ptr::copy_nonoverlapping(s.as_ptr(), buf.ptr.as_ptr().cast::<u8>(), s.len()) };
        Ok(buf)
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.ptr.as_ptr()
    }

    /// Size of the block in bytes.
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Decode the contents up to the first NUL.
    ///
    /// Never reads past the block. A block without a terminator was either
    /// truncated or never terminated, so it is an error, not a result.
    pub fn read_c_str(&self) -> Result<String, CurrencyError> {
        // SAFETY: the block is `len` initialised bytes owned by `self`.
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr.as_ptr().cast::<u8>(), self.len) };
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or(CurrencyError::Unterminated { capacity: self.len })?;
        Ok(std::str::from_utf8(&bytes[..end])?.to_owned())
    }
}

impl<N: NativeCurrency + ?Sized> Drop for NativeBuf<'_, N> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `self.native.alloc` and is released only here.
        unsafe { self.native.free(self.ptr.as_ptr().cast()) };
    }
}
