use super::*;
use crate::stub::StubNative;
use libc::{c_char, c_int, size_t};

/// Reports success but fills the whole buffer with digits and no NUL.
struct NoTerminator;

unsafe impl NativeCurrency for NoTerminator {
    fn name(&self) -> &str {
        "no-terminator"
    }

    unsafe fn format_currency(
        &self,
        _value: f64,
        _currency_code: *const c_char,
        _locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        std::ptr::write_bytes(out.cast::<u8>(), b'9', cap);
        0
    }

    unsafe fn get_currency_symbol(
        &self,
        _currency_code: *const c_char,
        _locale: *const c_char,
        out: *mut c_char,
        cap: size_t,
    ) -> c_int {
        std::ptr::write_bytes(out.cast::<u8>(), b'9', cap);
        0
    }
}

fn bridge(status: i32, output: &str) -> CurrencyBridge<StubNative> {
    CurrencyBridge::new(StubNative::returning(status, output))
}

#[test]
fn test_format_returns_native_output() {
    let b = bridge(0, "$1,234.50");
    let out = b.format("en-US", 1234.5, "USD").unwrap();
    assert_eq!(out, "$1,234.50");

    let calls = b.native().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].value, Some(1234.5));
    assert_eq!(calls[0].currency_code, "USD");
    assert_eq!(calls[0].locale, "en-US");
    assert_eq!(calls[0].capacity, BUF_SIZE_512);
    assert!(b.native().is_balanced());
}

#[test]
fn test_format_empty_code_never_reaches_native() {
    let b = bridge(0, "unused");
    let err = b.format("en-US", 10.0, "").unwrap_err();
    assert!(matches!(err, CurrencyError::InvalidArgument(_)));
    assert!(
        err.to_string().contains("10.000000"),
        "message should embed the value: {err}"
    );
    assert_eq!(b.native().native_calls(), 0);
    assert_eq!(b.native().allocs(), 0);
}

#[test]
fn test_format_native_failure_carries_status() {
    let b = bridge(3, "garbage");
    let err = b.format("xx-ZZ", 5.0, "USD").unwrap_err();
    assert_eq!(err.status(), Some(3));
    assert_eq!(
        err.to_string(),
        "error (3) formatting a currency for value 5.000000"
    );
    assert!(b.native().is_balanced());
}

#[test]
fn test_negative_status_is_success() {
    // ICU reports fallbacks as negative warning codes.
    let b = bridge(-128, "1,00 €");
    assert_eq!(b.format("de", 1.0, "EUR").unwrap(), "1,00 €");
}

#[test]
fn test_symbol_returns_native_output() {
    let b = bridge(0, "€");
    assert_eq!(b.symbol("fr-FR", "EUR").unwrap(), "€");
    assert_eq!(b.native().symbol_calls(), 1);
    assert_eq!(b.native().calls()[0].value, None);
    assert!(b.native().is_balanced());
}

#[test]
fn test_symbol_failure_releases_buffer() {
    let b = bridge(1, "");
    let err = b.symbol("fr-FR", "XXX").unwrap_err();
    assert_eq!(err.to_string(), "error (1) getting the currency symbol");
    assert_eq!(b.native().allocs(), 3);
    assert!(b.native().is_balanced());
}

#[test]
fn test_symbol_empty_code_passes_through_by_default() {
    let b = bridge(0, "¤");
    assert_eq!(b.symbol("en-US", "").unwrap(), "¤");
    assert_eq!(b.native().symbol_calls(), 1);
    assert_eq!(b.native().calls()[0].currency_code, "");
}

#[test]
fn test_symbol_empty_code_rejected_when_configured() {
    let config = BridgeConfig {
        validate_symbol_code: true,
        ..Default::default()
    };
    let b = CurrencyBridge::with_config(StubNative::new(), config);
    let err = b.symbol("en-US", "").unwrap_err();
    assert!(matches!(err, CurrencyError::InvalidArgument(_)));
    assert_eq!(b.native().native_calls(), 0);
}

#[test]
fn test_three_allocations_per_call() {
    let b = bridge(0, "$5.00");
    b.format("en-US", 5.0, "USD").unwrap();
    assert_eq!(b.native().allocs(), 3);
    assert_eq!(b.native().frees(), 3);
}

#[test]
fn test_allocation_failure_releases_earlier_buffers() {
    for n in 1..=3 {
        let b = bridge(0, "$5.00");
        b.native().fail_alloc_at(n);
        let err = b.format("en-US", 5.0, "USD").unwrap_err();
        assert!(matches!(err, CurrencyError::Alloc { .. }), "alloc #{n}: {err}");
        assert_eq!(b.native().native_calls(), 0);
        assert_eq!(b.native().allocs(), n - 1);
        assert!(b.native().is_balanced(), "leak when alloc #{n} fails");
    }
}

#[test]
fn test_interior_nul_releases_locale_buffer() {
    let b = bridge(0, "unused");
    let err = b.symbol("en-US", "E\0UR").unwrap_err();
    assert!(matches!(err, CurrencyError::InvalidArgument(_)));
    assert_eq!(b.native().native_calls(), 0);
    assert_eq!(b.native().allocs(), 1);
    assert!(b.native().is_balanced());
}

#[test]
fn test_output_longer_than_buffer_is_an_error() {
    let long = "9".repeat(BUF_SIZE_512 * 2);
    let b = bridge(0, &long);
    let err = b.format("en-US", 1.0, "USD").unwrap_err();
    assert_eq!(err.status(), Some(crate::stub::BUFFER_OVERFLOW_STATUS));
    assert!(b.native().is_balanced());
}

#[test]
fn test_output_filling_buffer_exactly_fits() {
    let fits = "9".repeat(BUF_SIZE_512 - 1);
    let b = bridge(0, &fits);
    assert_eq!(b.format("en-US", 1.0, "USD").unwrap(), fits);
}

#[test]
fn test_unterminated_output_is_rejected() {
    let b = CurrencyBridge::new(NoTerminator);
    let err = b.format("en-US", 1.0, "USD").unwrap_err();
    assert!(
        matches!(err, CurrencyError::Unterminated { capacity } if capacity == BUF_SIZE_512),
        "got: {err}"
    );
    let err = b.symbol("en-US", "USD").unwrap_err();
    assert!(matches!(err, CurrencyError::Unterminated { .. }), "got: {err}");
}

#[test]
fn test_mixed_outcomes_stay_balanced() {
    let b = bridge(0, "$1.00");
    b.format("en-US", 1.0, "USD").unwrap();
    b.native().set_status(7);
    assert!(b.format("en-US", 1.0, "USD").is_err());
    assert!(b.symbol("en-US", "USD").is_err());
    assert!(b.format("en-US", 1.0, "").is_err());
    b.native().set_status(0);
    b.symbol("en-US", "USD").unwrap();
    assert_eq!(b.native().allocs(), 12);
    assert!(b.native().is_balanced());
}

#[test]
fn test_concurrent_calls_stay_balanced() {
    let b = Arc::new(bridge(0, "$2.00"));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let b = Arc::clone(&b);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    assert_eq!(b.format("en-US", 2.0, "USD").unwrap(), "$2.00");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(b.native().format_calls(), 200);
    assert!(b.native().is_balanced());
}

#[tokio::test]
async fn test_format_async_returns_output() {
    let b = Arc::new(bridge(0, "$1,234.50"));
    let out = Arc::clone(&b)
        .format_async("en-US".to_string(), 1234.5, "USD".to_string())
        .await
        .unwrap();
    assert_eq!(out, "$1,234.50");
    assert!(b.native().is_balanced());
}

#[tokio::test]
async fn test_symbol_async_propagates_native_error() {
    let b = Arc::new(bridge(4, ""));
    let err = Arc::clone(&b)
        .symbol_async("fr-FR".to_string(), "EUR".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(4));
}

#[tokio::test]
async fn test_async_timeout() {
    let config = BridgeConfig {
        timeout_ms: 20,
        ..Default::default()
    };
    let stub = StubNative::returning(0, "$1.00");
    stub.set_delay(Duration::from_millis(500));
    let b = Arc::new(CurrencyBridge::with_config(stub, config));

    let err = Arc::clone(&b)
        .format_async("en-US".to_string(), 1.0, "USD".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, CurrencyError::Timeout(20)));

    // The abandoned call still finishes and releases its buffers.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(b.native().is_balanced());
}
