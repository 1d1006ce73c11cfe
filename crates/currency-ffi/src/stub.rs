//! Scripted native backend.
//!
//! [`StubNative`] stands in for the ICU bridge in tests: it returns a
//! configurable status, writes a configurable output, records every call and
//! tracks each allocation so leaks and double frees can be asserted on.

use std::collections::HashSet;
use std::ffi::CStr;
use std::sync::atomic::{AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use currency_core::native::NativeCurrency;
use libc::{c_char, c_int, c_void, size_t};

/// ICU's `U_BUFFER_OVERFLOW_ERROR`, reported when the output does not fit.
pub const BUFFER_OVERFLOW_STATUS: c_int = 15;

/// One recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub struct StubCall {
    /// `None` for symbol lookups.
    pub value: Option<f64>,
    pub currency_code: String,
    pub locale: String,
    pub capacity: usize,
}

/// Allocation-tracking test double for [`NativeCurrency`].
#[derive(Debug, Default)]
pub struct StubNative {
    status: AtomicI32,
    delay_ms: AtomicU64,
    output: Mutex<Vec<u8>>,
    calls: Mutex<Vec<StubCall>>,
    format_calls: AtomicUsize,
    symbol_calls: AtomicUsize,
    alloc_attempts: AtomicUsize,
    fail_alloc_at: AtomicUsize,
    live: Mutex<HashSet<usize>>,
    allocs: AtomicUsize,
    frees: AtomicUsize,
    double_frees: AtomicUsize,
}

impl StubNative {
    /// A stub that succeeds with an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stub that reports `status` and writes `output` into the result buffer.
    pub fn returning(status: i32, output: &str) -> Self {
        let stub = Self::new();
        stub.set_status(status);
        stub.set_output(output.as_bytes());
        stub
    }

    pub fn set_status(&self, status: i32) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Bytes written into the result buffer.
    ///
    /// Output that does not fit is cut, NUL-terminated and reported with
    /// [`BUFFER_OVERFLOW_STATUS`] unless a failure status is already set.
    pub fn set_output(&self, output: &[u8]) {
        *lock(&self.output) = output.to_vec();
    }

    /// Block every native call for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Make the `n`-th allocation (1-based) return null. 0 disables.
    pub fn fail_alloc_at(&self, n: usize) {
        self.fail_alloc_at.store(n, Ordering::SeqCst);
    }

    pub fn format_calls(&self) -> usize {
        self.format_calls.load(Ordering::SeqCst)
    }

    pub fn symbol_calls(&self) -> usize {
        self.symbol_calls.load(Ordering::SeqCst)
    }

    /// Total native calls of either kind.
    pub fn native_calls(&self) -> usize {
        self.format_calls() + self.symbol_calls()
    }

    /// Successful allocations.
    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn double_frees(&self) -> usize {
        self.double_frees.load(Ordering::SeqCst)
    }

    /// Allocations not yet released.
    pub fn live_allocations(&self) -> usize {
        lock(&self.live).len()
    }

    /// Every allocation was released exactly once.
    pub fn is_balanced(&self) -> bool {
        self.allocs() == self.frees() && self.double_frees() == 0 && self.live_allocations() == 0
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<StubCall> {
        lock(&self.calls).clone()
    }

    /// # Safety
    ///
    /// Same contract as [`NativeCurrency::format_currency`].
    unsafe fn respond(
        &self,
        value: Option<f64>,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        lock(&self.calls).push(StubCall {
            value,
            currency_code: CStr::from_ptr(currency_code).to_string_lossy().into_owned(),
            locale: CStr::from_ptr(locale).to_string_lossy().into_owned(),
            capacity: cap,
        });

        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }

        // Written regardless of status: callers must ignore it on failure.
        let mut overflow = false;
        if cap > 0 {
            let output = lock(&self.output);
            let n = output.len().min(cap - 1);
            std::ptr::copy_nonoverlapping(output.as_ptr(), out.cast::<u8>(), n);
            *out.add(n) = 0;
            overflow = n < output.len();
        }
        match self.status.load(Ordering::SeqCst) {
            0 if overflow => BUFFER_OVERFLOW_STATUS,
            status => status,
        }
    }
}

unsafe impl NativeCurrency for StubNative {
    fn name(&self) -> &str {
        "stub"
    }

    fn alloc(&self, size: size_t) -> *mut c_void {
        let attempt = self.alloc_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_alloc_at.load(Ordering::SeqCst) {
            return std::ptr::null_mut();
        }
        // SAFETY: malloc has no preconditions.
        let ptr = unsafe { libc::malloc(size) };
        if !ptr.is_null() {
            lock(&self.live).insert(ptr as usize);
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        if !lock(&self.live).remove(&(ptr as usize)) {
            self.double_frees.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.frees.fetch_add(1, Ordering::SeqCst);
        libc::free(ptr);
    }

    unsafe fn format_currency(
        &self,
        value: f64,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        self.format_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(Some(value), currency_code, locale, out, cap)
    }

    unsafe fn get_currency_symbol(
        &self,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        self.symbol_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(None, currency_code, locale, out, cap)
    }
}

impl Drop for StubNative {
    fn drop(&mut self) {
        for ptr in lock(&self.live).drain() {
            // SAFETY: still-live blocks came from malloc in `alloc`.
            unsafe { libc::free(ptr as *mut c_void) };
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
