//! Error macros for tonebench

/// Macro for creating usage errors
#[macro_export]
macro_rules! bail_usage {
    ($msg:expr) => {
        return Err($crate::error::TonebenchError::UsageError($msg.to_string()))
    };
}

/// Macro for creating input-not-found errors
#[macro_export]
macro_rules! bail_missing_input {
    ($kind:expr, $path:expr) => {
        return Err($crate::error::TonebenchError::input_not_found($kind, $path))
    };
}
