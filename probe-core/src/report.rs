//! 未捕获异常报告
//!
//! 格式化为：
//!
//! ```text
//! Traceback (most recent call last):
//!   File "main.py", line 3, in step
//! ValueError: bad reading
//! ```
//!
//! 行号与堆栈回溯使用同一换算（记录行号减一）。

use std::fmt::Write;
use std::sync::Arc;

/// 回溯条目，`line` 为代码块行号表中记录的原始行号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackEntry {
    pub file: Arc<str>,
    pub line: u32,
    pub block: Arc<str>,
}

/// 解释器抛出的异常
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub kind: Arc<str>,
    pub message: String,
    /// 展开顺序：最内层在前
    pub traceback: Vec<TracebackEntry>,
}

impl Exception {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: Arc::from(kind),
            message: message.into(),
            traceback: Vec::new(),
        }
    }

    pub fn with_entry(mut self, entry: TracebackEntry) -> Self {
        self.traceback.push(entry);
        self
    }
}

/// 记录行号换算为报告行号
pub fn reported_line(recorded: u32) -> usize {
    recorded.saturating_sub(1) as usize
}

/// 格式化异常报告
pub fn format_exception(exception: &Exception) -> String {
    let mut out = String::new();
    if !exception.traceback.is_empty() {
        out.push_str("Traceback (most recent call last):\n");
        for entry in exception.traceback.iter().rev() {
            let _ = writeln!(
                out,
                "  File \"{}\", line {}, in {}",
                entry.file,
                reported_line(entry.line),
                entry.block
            );
        }
    }
    if exception.message.is_empty() {
        out.push_str(&exception.kind);
    } else {
        let _ = write!(out, "{}: {}", exception.kind, exception.message);
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file: &str, line: u32, block: &str) -> TracebackEntry {
        TracebackEntry {
            file: Arc::from(file),
            line,
            block: Arc::from(block),
        }
    }

    #[test]
    fn test_reported_line() {
        assert_eq!(reported_line(5), 4);
        assert_eq!(reported_line(1), 0);
        assert_eq!(reported_line(0), 0);
    }

    #[test]
    fn test_format_without_traceback() {
        let exc = Exception::new("ValueError", "bad reading");
        assert_eq!(format_exception(&exc), "ValueError: bad reading\n");
        let bare = Exception::new("KeyboardInterrupt", "");
        assert_eq!(format_exception(&bare), "KeyboardInterrupt\n");
    }

    #[test]
    fn test_format_most_recent_last() {
        let exc = Exception::new("ValueError", "bad reading")
            .with_entry(entry("main.py", 8, "read"))
            .with_entry(entry("main.py", 4, "<module>"));
        let text = format_exception(&exc);
        assert_eq!(
            text,
            "Traceback (most recent call last):\n\
             \x20 File \"main.py\", line 3, in <module>\n\
             \x20 File \"main.py\", line 7, in read\n\
             ValueError: bad reading\n"
        );
    }
}
