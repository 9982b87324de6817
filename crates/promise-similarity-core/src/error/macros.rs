//! Error macros for promise-similarity

/// Macro for creating invalid value errors
#[macro_export]
macro_rules! bail_invalid {
    ($context:expr, $value:expr) => {
        return Err($crate::error::PromiseError::invalid_value($context, $value))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! bail_config {
    ($msg:expr) => {
        return Err($crate::error::PromiseError::Configuration(
            $msg.to_string(),
        ))
    };
}
