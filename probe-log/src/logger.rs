//! 日志器

use crate::operation::OperationGuard;
use crate::record::{Level, Record};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// 日志输出目标
pub trait LogSink: Send + Sync {
    fn write(&self, record: &Record);
}

/// 日志器
///
/// 全局级别之外可以给模块路径前缀单独设级别，最长前缀优先。
pub struct Logger {
    level: AtomicU8,
    overrides: RwLock<Vec<(String, Level)>>,
    sinks: RwLock<Vec<Box<dyn LogSink>>>,
    operations: Mutex<Vec<&'static str>>,
    next_seq: AtomicU64,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks = self.sinks.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("sinks", &sinks)
            .finish()
    }
}

impl Logger {
    pub fn new(level: Level) -> Arc<Self> {
        Arc::new(Logger {
            level: AtomicU8::new(level as u8),
            overrides: RwLock::new(Vec::new()),
            sinks: RwLock::new(Vec::new()),
            operations: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        })
    }

    /// 没有输出目标、只放行 Error 的日志器
    pub fn noop() -> Arc<Self> {
        Self::new(Level::Error)
    }

    pub fn with_sink<S: LogSink + 'static>(self: Arc<Self>, sink: S) -> Arc<Self> {
        self.add_sink(sink);
        self
    }

    pub fn add_sink<S: LogSink + 'static>(&self, sink: S) {
        if let Ok(mut sinks) = self.sinks.write() {
            sinks.push(Box::new(sink));
        }
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::from_index(self.level.load(Ordering::Relaxed))
    }

    /// 给模块路径前缀设置级别，同一前缀重复设置时覆盖
    pub fn set_target_level(&self, prefix: impl Into<String>, level: Level) {
        let prefix = prefix.into();
        if let Ok(mut overrides) = self.overrides.write() {
            match overrides.iter_mut().find(|(p, _)| *p == prefix) {
                Some(entry) => entry.1 = level,
                None => overrides.push((prefix, level)),
            }
        }
    }

    /// 某模块生效的级别
    pub fn level_for(&self, target: &str) -> Level {
        let Ok(overrides) = self.overrides.read() else {
            return self.level();
        };
        overrides
            .iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|&(_, level)| level)
            .unwrap_or_else(|| self.level())
    }

    /// 只看全局级别
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    pub fn enabled_for(&self, level: Level, target: &str) -> bool {
        level >= self.level_for(target)
    }

    /// 宏的落点
    #[inline(never)]
    pub fn log(&self, level: Level, target: &'static str, message: impl Into<String>) {
        if !self.enabled_for(level, target) {
            return;
        }

        let mut record = Record::new(level, target, message);
        record.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        record.operation = self.current_operation();

        if let Ok(sinks) = self.sinks.read() {
            for sink in sinks.iter() {
                sink.write(&record);
            }
        }
    }

    /// 标记一次自省操作，其间的记录都带上操作名
    pub fn operation(self: &Arc<Self>, name: &'static str) -> OperationGuard {
        if let Ok(mut ops) = self.operations.lock() {
            ops.push(name);
        }
        OperationGuard {
            logger: Arc::clone(self),
        }
    }

    pub(crate) fn leave_operation(&self) {
        if let Ok(mut ops) = self.operations.lock() {
            ops.pop();
        }
    }

    pub fn current_operation(&self) -> Option<&'static str> {
        self.operations.lock().ok().and_then(|ops| ops.last().copied())
    }
}

/// 标准错误输出
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, record: &Record) {
        eprintln!("{record}");
    }
}
