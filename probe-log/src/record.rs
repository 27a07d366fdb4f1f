//! 日志记录

use std::fmt;

/// 日志级别，数值越大越严重
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    #[default]
    Warn = 3,
    Error = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// 从原子存储的数值还原
    pub(crate) fn from_index(index: u8) -> Level {
        Self::ALL
            .get(index as usize)
            .copied()
            .unwrap_or(Level::Error)
    }

    /// 大小写不敏感解析
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(text))
            .or_else(|| text.eq_ignore_ascii_case("warning").then_some(Level::Warn))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 单条日志记录
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// 日志器内单调递增的序号
    pub seq: u64,
    pub level: Level,
    /// 发出日志的模块路径
    pub target: &'static str,
    /// 记录时正在进行的自省操作
    pub operation: Option<&'static str>,
    pub message: String,
}

impl Record {
    pub fn new(level: Level, target: &'static str, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            target,
            operation: None,
            message: message.into(),
        }
    }

    pub fn in_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<4} {:<5} {}", self.seq, self.level, self.target)?;
        if let Some(op) = self.operation {
            write!(f, " <{op}>")?;
        }
        write!(f, ": {}", self.message)
    }
}
