use libc::{c_char, c_int, c_void, size_t};

/// Native formatting library — the collaborator behind the boundary.
///
/// Mirrors the two C entry points of the ICU bridge plus the allocator used
/// for every buffer that crosses the boundary. The default allocator is
/// `malloc`/`free`; test doubles override it to track ownership.
///
/// # Safety
///
/// Implementors of the call methods must only write a NUL-terminated string of
/// at most `cap` bytes (terminator included) into `out`, and must not retain
/// any of the pointers after returning.
pub unsafe trait NativeCurrency: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Allocate `size` bytes of native memory. Returns null on failure.
    fn alloc(&self, size: size_t) -> *mut c_void {
        // SAFETY: malloc has no preconditions.
        unsafe { libc::malloc(size) }
    }

    /// Release memory obtained from [`NativeCurrency::alloc`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `alloc` on this backend and must not have been
    /// released already.
    unsafe fn free(&self, ptr: *mut c_void) {
        libc::free(ptr)
    }

    /// `formatCurrency(value, code, locale, out, cap) -> status`.
    ///
    /// # Safety
    ///
    /// `currency_code` and `locale` must be valid NUL-terminated strings and
    /// `out` must be writable for `cap` bytes.
    unsafe fn format_currency(
        &self,
        value: f64,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int;

    /// `getCurrencySymbol(code, locale, out, cap) -> status`.
    ///
    /// # Safety
    ///
    /// Same requirements as [`NativeCurrency::format_currency`].
    unsafe fn get_currency_symbol(
        &self,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int;
}
