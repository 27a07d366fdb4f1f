//! 日志器构建配置

use crate::{Level, LogRingBuffer, Logger, StderrSink};
use std::sync::Arc;

/// 日志器构建配置
///
/// ```
/// use probe_log::{LogConfig, Level};
///
/// let (logger, ring) = LogConfig::new(Level::Warn)
///     .with_target("probe_core::inspect", Level::Debug)
///     .with_ring_buffer(64)
///     .init();
/// assert!(ring.is_some());
/// assert_eq!(logger.level_for("probe_core::inspect::attrs"), Level::Debug);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub level: Level,
    /// 模块前缀级别
    pub targets: Vec<(String, Level)>,
    pub stderr: bool,
    pub ring_buffer: Option<usize>,
}

impl LogConfig {
    pub fn new(level: Level) -> Self {
        LogConfig {
            level,
            ..Self::default()
        }
    }

    /// 测试用：Trace 级别，只写环形缓冲区
    pub fn test() -> Self {
        Self::new(Level::Trace).with_ring_buffer(4096)
    }

    pub fn with_target(mut self, prefix: impl Into<String>, level: Level) -> Self {
        self.targets.push((prefix.into(), level));
        self
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_ring_buffer(mut self, capacity: usize) -> Self {
        self.ring_buffer = Some(capacity);
        self
    }

    /// 构建日志器；配置了环形缓冲区时一并返回
    pub fn init(self) -> (Arc<Logger>, Option<Arc<LogRingBuffer>>) {
        let logger = Logger::new(self.level);
        for (prefix, level) in self.targets {
            logger.set_target_level(prefix, level);
        }
        if self.stderr {
            logger.add_sink(StderrSink);
        }
        let ring = self.ring_buffer.map(|capacity| {
            let ring = LogRingBuffer::new(capacity);
            logger.add_sink(Arc::clone(&ring));
            ring
        });
        (logger, ring)
    }
}
