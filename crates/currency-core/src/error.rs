use thiserror::Error;

/// Top-level error type for the currency bridge.
#[derive(Debug, Error)]
pub enum CurrencyError {
    /// A required argument was rejected before crossing the native boundary.
    #[error("{0}")]
    InvalidArgument(String),

    /// The native library reported a nonzero status code.
    ///
    /// The code is opaque here and passed through verbatim.
    #[error("error ({status}) {context}")]
    Native { status: i32, context: String },

    /// The native allocator returned null.
    #[error("native allocation of {size} bytes failed")]
    Alloc { size: usize },

    /// The native output filled the buffer without a NUL terminator.
    #[error("native output is not NUL-terminated within {capacity} bytes")]
    Unterminated { capacity: usize },

    /// The native output was not valid UTF-8.
    #[error("native output is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An async call exceeded its deadline.
    #[error("native call timed out after {0} ms")]
    Timeout(u64),

    /// The blocking task running the native call did not complete.
    #[error("native call task failed: {0}")]
    Join(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CurrencyError {
    /// The raw native status code, if this error came from the native library.
    pub fn status(&self) -> Option<i32> {
        match self {
            Self::Native { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_message_contains_status() {
        let err = CurrencyError::Native {
            status: 3,
            context: "formatting a currency for value 5.000000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "error (3) formatting a currency for value 5.000000"
        );
        assert_eq!(err.status(), Some(3));
    }

    #[test]
    fn test_non_native_errors_have_no_status() {
        let err = CurrencyError::InvalidArgument("bad".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(CurrencyError::Timeout(250).to_string(), "native call timed out after 250 ms");
    }
}
