//! probe-log - 结构化日志
//!
//! 自省层的日志不走全局状态：`Arc<Logger>` 随 `PausedVm`、`Machine`
//! 和会话配置一起显式传递。
//! - 按模块路径前缀设置级别，最长前缀优先
//! - `Logger::operation` 给一次自省调用期间的记录打上操作名
//! - 测试里挂一个 `LogRingBuffer` 即可断言日志
//!
//! ```
//! use probe_log::{LogConfig, debug};
//!
//! let (logger, ring) = LogConfig::test().init();
//! let _op = logger.operation("stack_trace");
//! debug!(logger, "paused at frame {}", 3);
//! assert_eq!(ring.unwrap().messages_in("stack_trace"), ["paused at frame 3"]);
//! ```

mod config;
mod logger;
mod macros;
mod operation;
mod record;
mod ring_buffer;

pub use config::LogConfig;
pub use logger::{LogSink, Logger, StderrSink};
pub use operation::OperationGuard;
pub use record::{Level, Record};
pub use ring_buffer::LogRingBuffer;
