//! API 类型定义
//!
//! 自省结果的可序列化形式。

use serde::Serialize;

use probe_core::{StackTrace, TraceFrame};

/// 一帧回溯
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    pub block_name: String,
    pub file: String,
    pub line: usize,
}

impl From<&TraceFrame> for FrameReport {
    fn from(frame: &TraceFrame) -> Self {
        Self {
            block_name: frame.block_name.to_string(),
            file: frame.file.to_string(),
            line: frame.line,
        }
    }
}

/// 调用栈
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceReport {
    pub frames: Vec<FrameReport>,
    pub truncated: bool,
}

impl From<&StackTrace> for TraceReport {
    fn from(trace: &StackTrace) -> Self {
        Self {
            frames: trace.frames.iter().map(FrameReport::from).collect(),
            truncated: trace.truncated,
        }
    }
}

impl std::fmt::Display for TraceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for frame in &self.frames {
            writeln!(
                f,
                "  File \"{}\", line {}, in {}",
                frame.file, frame.line, frame.block_name
            )?;
        }
        if self.truncated {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}
