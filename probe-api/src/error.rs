//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use serde::Serialize;
use thiserror::Error;

pub use probe_core::InspectError;

/// Probe 错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 自省失败（前置条件、超长路径、找不到）
    #[error("{0}")]
    Inspect(#[from] InspectError),

    /// 快照解析错误
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// 快照内容不一致
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            ProbeError::Inspect(_) => "inspect",
            ProbeError::Snapshot(_) | ProbeError::InvalidSnapshot(_) => "snapshot",
            ProbeError::Config(_) => "config",
            ProbeError::Io(_) => "io",
        }
    }

    /// 错误种类
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Inspect(e) => match e {
                InspectError::NotPaused => "NotPaused",
                InspectError::Busy => "Busy",
                InspectError::NoActiveScope => "NoActiveScope",
                InspectError::SegmentTooLong { .. } => "SegmentTooLong",
                InspectError::NotFound => "NotFound",
            },
            ProbeError::Snapshot(_) => "SnapshotSyntax",
            ProbeError::InvalidSnapshot(_) => "InvalidSnapshot",
            ProbeError::Config(_) => "ConfigError",
            ProbeError::Io(_) => "IoError",
        }
    }

    /// 转换为结构化错误报告
    pub fn to_report(&self) -> ErrorReport {
        let line = match self {
            ProbeError::Snapshot(e) => Some(e.line()),
            _ => None,
        };
        ErrorReport {
            phase: self.phase(),
            line,
            error_kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub phase: &'static str,
    pub line: Option<usize>,
    pub error_kind: String,
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] {} error: {}", line, self.phase, self.message),
            None => write!(f, "[{}] error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
