//! 日志宏
//!
//! 目标固定为调用处的 `module_path!()`，级别未启用时不格式化消息。

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($logger:expr, $level:ident, $($arg:tt)+) => {{
        let logger = &$logger;
        if logger.enabled_for($crate::Level::$level, module_path!()) {
            logger.log($crate::Level::$level, module_path!(), ::std::format!($($arg)+));
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, Trace, $($arg)+) };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, Debug, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, Info, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, Warn, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => { $crate::__emit!($logger, Error, $($arg)+) };
}
