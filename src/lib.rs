pub mod admin_cli;
pub mod auth;
pub mod core;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod repositories;
pub mod utils;
pub mod web;

#[cfg(test)]
mod test_support;

pub use web::{build_rocket, start_web_server};

/// Forward to the matching `tracing` macro, e.g. `app_log!(info, "x = {}", x)`.
#[macro_export]
macro_rules! app_log {
    (trace, $($arg:tt)+) => { ::tracing::trace!($($arg)+) };
    (debug, $($arg:tt)+) => { ::tracing::debug!($($arg)+) };
    (info, $($arg:tt)+) => { ::tracing::info!($($arg)+) };
    (warn, $($arg:tt)+) => { ::tracing::warn!($($arg)+) };
    (error, $($arg:tt)+) => { ::tracing::error!($($arg)+) };
}
