#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use currency_core::{
    config::BridgeConfig, error::CurrencyError, native::NativeCurrency, BUF_SIZE_512,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::buffer::NativeBuf;

/// Currency formatting and symbol lookup over a [`NativeCurrency`] backend.
///
/// Stateless apart from its configuration: every call owns its native
/// buffers, so a bridge can be shared across threads.
pub struct CurrencyBridge<N: NativeCurrency> {
    native: N,
    config: BridgeConfig,
}

impl<N: NativeCurrency> CurrencyBridge<N> {
    pub fn new(native: N) -> Self {
        Self::with_config(native, BridgeConfig::default())
    }

    pub fn with_config(native: N, config: BridgeConfig) -> Self {
        Self { native, config }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Format `value` as `currency_code` for `locale`.
    pub fn format(
        &self,
        locale: &str,
        value: f64,
        currency_code: &str,
    ) -> Result<String, CurrencyError> {
        if currency_code.is_empty() {
            return Err(CurrencyError::InvalidArgument(format!(
                "error (empty currency code) formatting a currency for value {value:.6}"
            )));
        }

        let locale_c = NativeBuf::copy_str(&self.native, locale)?;
        let code_c = NativeBuf::copy_str(&self.native, currency_code)?;
        let mut out = NativeBuf::alloc(&self.native, BUF_SIZE_512)?;

        // SAFETY: both strings are NUL-terminated and `out` is writable for
        // its full capacity; all three outlive the call.
        let status = unsafe {
            self.native.format_currency(
                value,
                code_c.as_ptr(),
                locale_c.as_ptr(),
                out.as_mut_ptr(),
                out.capacity(),
            )
        };
        debug!(
            backend = self.native.name(),
            locale, currency_code, value, status, "formatCurrency"
        );

        // Negative codes are ICU warnings; the output is still valid.
        if status > 0 {
            warn!("formatCurrency failed for {currency_code} in {locale}: status {status}");
            return Err(CurrencyError::Native {
                status,
                context: format!("formatting a currency for value {value:.6}"),
            });
        }
        out.read_c_str()
    }

    /// Look up the symbol of `currency_code` for `locale`.
    ///
    /// An empty code is only rejected locally when `validate_symbol_code` is
    /// set; otherwise it is handed to the native library as is.
    pub fn symbol(&self, locale: &str, currency_code: &str) -> Result<String, CurrencyError> {
        if self.config.validate_symbol_code && currency_code.is_empty() {
            return Err(CurrencyError::InvalidArgument(
                "error (empty currency code) getting the currency symbol".to_string(),
            ));
        }

        let locale_c = NativeBuf::copy_str(&self.native, locale)?;
        let code_c = NativeBuf::copy_str(&self.native, currency_code)?;
        let mut out = NativeBuf::alloc(&self.native, BUF_SIZE_512)?;

        // SAFETY: see `format`.
        let status = unsafe {
            self.native.get_currency_symbol(
                code_c.as_ptr(),
                locale_c.as_ptr(),
                out.as_mut_ptr(),
                out.capacity(),
            )
        };
        debug!(
            backend = self.native.name(),
            locale, currency_code, status, "getCurrencySymbol"
        );

        if status > 0 {
            warn!("getCurrencySymbol failed for {currency_code} in {locale}: status {status}");
            return Err(CurrencyError::Native {
                status,
                context: "getting the currency symbol".to_string(),
            });
        }
        out.read_c_str()
    }
}

impl<N: NativeCurrency + 'static> CurrencyBridge<N> {
    /// [`CurrencyBridge::format`] on a blocking thread, bounded by `timeout_ms`.
    ///
    /// On timeout the native call keeps running in the background; its
    /// buffers are still released when it finishes.
    pub async fn format_async(
        self: Arc<Self>,
        locale: String,
        value: f64,
        currency_code: String,
    ) -> Result<String, CurrencyError> {
        let timeout_ms = self.config.timeout_ms;
        let task =
            tokio::task::spawn_blocking(move || self.format(&locale, value, &currency_code));
        join_with_deadline(task, timeout_ms).await
    }

    /// [`CurrencyBridge::symbol`] on a blocking thread, bounded by `timeout_ms`.
    pub async fn symbol_async(
        self: Arc<Self>,
        locale: String,
        currency_code: String,
    ) -> Result<String, CurrencyError> {
        let timeout_ms = self.config.timeout_ms;
        let task = tokio::task::spawn_blocking(move || self.symbol(&locale, &currency_code));
        join_with_deadline(task, timeout_ms).await
    }
}

/// Await a blocking native call, giving up after `timeout_ms` (0 = never).
async fn join_with_deadline(
    task: JoinHandle<Result<String, CurrencyError>>,
    timeout_ms: u64,
) -> Result<String, CurrencyError> {
    let joined = if timeout_ms == 0 {
        task.await
    } else {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("native call exceeded {timeout_ms} ms");
                return Err(CurrencyError::Timeout(timeout_ms));
            }
        }
    };
    joined.map_err(|e| CurrencyError::Join(e.to_string()))?
}
