//! Logging macros shared by every crate in the workspace.
//!
//! They are thin wrappers over `tracing` so that the terminal formatter can
//! pick a symbol for each kind of message. `success!` is an `INFO` event with
//! its own target, the formatter renders it with a check mark.

/// Target used for events that mark a finished unit of work.
pub const SUCCESS_TARGET: &str = "ionicsub::success";

/// Target used for raw terminal output (banners, headers, summaries).
pub const PRINT_TARGET: &str = "ionicsub::print";

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "ionicsub::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::tracing::error!($($arg)*)
    };
}
