mod scripted;

pub use scripted::*;

use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run `$expr` with logging turned off, for calls expected to log errors.
#[macro_export]
macro_rules! silent_logs {
    ($($expr:tt)+) => {{
        let level = ::log::max_level();
        ::log::set_max_level(::log::LevelFilter::Off);
        let result = { $($expr)+ };
        ::log::set_max_level(level);
        result
    }};
}
