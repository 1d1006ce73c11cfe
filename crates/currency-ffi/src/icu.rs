//! ICU4C backend.
//!
//! Links against `libicubridge`, a thin C shim over ICU's `unum_*` and
//! `ucurr_*` APIs exporting `formatCurrency` and `getCurrencySymbol`. The
//! search path is supplied at build time (e.g. `RUSTFLAGS="-L /opt/icu/lib"`).

use currency_core::{error::CurrencyError, native::NativeCurrency};
use libc::{c_char, c_int, size_t};

use crate::bridge::CurrencyBridge;

#[link(name = "icubridge")]
extern "C" {
    #[link_name = "formatCurrency"]
    fn icu_format_currency(
        value: f64,
        currency_code: *const c_char,
        locale: *const c_char,
        res: *mut c_char,
        res_size: size_t,
    ) -> c_int;

    #[link_name = "getCurrencySymbol"]
    fn icu_get_currency_symbol(
        currency_code: *const c_char,
        locale: *const c_char,
        res: *mut c_char,
        res_size: size_t,
    ) -> c_int;
}

/// The linked ICU bridge, allocating with `malloc`/`free`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcuNative;

// SAFETY: the bridge writes at most `res_size` bytes, NUL included, and keeps
// no pointers past the call.
unsafe impl NativeCurrency for IcuNative {
    fn name(&self) -> &str {
        "icu4c"
    }

    unsafe fn format_currency(
        &self,
        value: f64,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        icu_format_currency(value, currency_code, locale, out, cap)
    }

    unsafe fn get_currency_symbol(
        &self,
        currency_code: *const c_char,
        locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        icu_get_currency_symbol(currency_code, locale, out, cap)
    }
}

/// Format `value` as `currency_code` for `locale` with the default bridge.
pub fn format(locale: &str, value: f64, currency_code: &str) -> Result<String, CurrencyError> {
    CurrencyBridge::new(IcuNative).format(locale, value, currency_code)
}

/// Currency symbol of `currency_code` for `locale` with the default bridge.
pub fn symbol(locale: &str, currency_code: &str) -> Result<String, CurrencyError> {
    CurrencyBridge::new(IcuNative).symbol(locale, currency_code)
}
