//! CLI 配置
//!
//! 包含 CLI 特有的配置：日志配置和会话配置的组合，可从 JSON 文件加载

use std::path::Path;

use probe_config::{InspectConfig, LimitConfig, Phase};
use serde::Deserialize;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub resolve: Option<Level>,
    pub trace: Option<Level>,
    pub attrs: Option<Level>,
    pub format: Option<Level>,
    pub vm: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            resolve: None,
            trace: None,
            attrs: None,
            format: None,
            vm: None,
        }
    }
}

impl LogConfig {
    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let specific = match phase {
            Phase::Resolve => self.resolve,
            Phase::Trace => self.trace,
            Phase::Attrs => self.attrs,
            Phase::Format => self.format,
            Phase::Vm => self.vm,
            Phase::Api => None,
        };
        specific.unwrap_or(self.global)
    }

    /// Most verbose level any phase asks for
    pub fn max_level(&self) -> Level {
        Phase::all()
            .iter()
            .map(|&phase| self.level_for(phase))
            .max()
            .unwrap_or(self.global)
    }
}

/// 配置文件中的日志段
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogSection {
    level: Option<String>,
    resolve: Option<String>,
    trace: Option<String>,
    attrs: Option<String>,
    format: Option<String>,
    vm: Option<String>,
}

/// 配置文件结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub inspect: InspectConfig,
    pub limits: LimitConfig,
    log: LogSection,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;
        serde_json::from_str(&content).map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))
    }

    /// 日志配置；未知级别名报错
    pub fn log_config(&self) -> Result<LogConfig, String> {
        let parse = |value: &Option<String>| -> Result<Option<Level>, String> {
            value
                .as_deref()
                .map(|s| parse_log_level(s).ok_or_else(|| format!("未知日志级别 '{}'", s)))
                .transpose()
        };
        let mut config = LogConfig::default();
        if let Some(level) = parse(&self.log.level)? {
            config.global = level;
        }
        config.resolve = parse(&self.log.resolve)?;
        config.trace = parse(&self.log.trace)?;
        config.attrs = parse(&self.log.attrs)?;
        config.format = parse(&self.log.format)?;
        config.vm = parse(&self.log.vm)?;
        Ok(config)
    }
}

/// Parse log level string
pub fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "silent" | "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// tracing 级别转换为库日志级别
pub fn to_probe_level(level: Level) -> probe_log::Level {
    if level == Level::TRACE {
        probe_log::Level::Trace
    } else if level == Level::DEBUG {
        probe_log::Level::Debug
    } else if level == Level::INFO {
        probe_log::Level::Info
    } else if level == Level::WARN {
        probe_log::Level::Warn
    } else {
        probe_log::Level::Error
    }
}
