//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制；库内的 `probe-log`
//! 记录通过 `TracingSink` 转发到 `tracing`。

use std::io;
use std::sync::Mutex;

use probe_config::Phase;
use probe_log::{LogSink, Record};
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// 使用指定格式和日志配置初始化日志系统
///
/// 指定文件时同时输出到 stderr 和文件。
pub fn init_with_file<P: AsRef<std::path::Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> io::Result<()> {
    let mut targets = Targets::new().with_default(log_config.global);
    for phase in Phase::all() {
        targets = targets.with_target(phase.target(), log_config.level_for(phase));
    }

    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let console_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file_handle))
            .with_filter(targets);

        let _ = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init();
    } else {
        let console_layer = create_format_layer(format, io::stderr).with_filter(targets);
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
    }
    Ok(())
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

/// 由模块路径推断日志阶段
pub fn phase_of(module: &str) -> Phase {
    let last = module.rsplit("::").next().unwrap_or(module);
    match last {
        "resolve" | "path" => Phase::Resolve,
        "trace" => Phase::Trace,
        "attrs" => Phase::Attrs,
        "format" => Phase::Format,
        _ if module.split("::").any(|seg| seg == "vm") => Phase::Vm,
        _ => Phase::Api,
    }
}

/// 把 `probe-log` 记录转发到 `tracing`
pub struct TracingSink;

macro_rules! forward {
    ($target:literal, $record:expr) => {{
        let record = $record;
        let module = record.target;
        match record.level {
            probe_log::Level::Trace => {
                tracing::trace!(target: $target, module, "{}", record.message)
            }
            probe_log::Level::Debug => {
                tracing::debug!(target: $target, module, "{}", record.message)
            }
            probe_log::Level::Info => {
                tracing::info!(target: $target, module, "{}", record.message)
            }
            probe_log::Level::Warn => {
                tracing::warn!(target: $target, module, "{}", record.message)
            }
            probe_log::Level::Error => {
                tracing::error!(target: $target, module, "{}", record.message)
            }
        }
    }};
}

impl LogSink for TracingSink {
    fn write(&self, record: &Record) {
        match phase_of(record.target) {
            Phase::Resolve => forward!("probe::resolve", record),
            Phase::Trace => forward!("probe::trace", record),
            Phase::Attrs => forward!("probe::attrs", record),
            Phase::Format => forward!("probe::format", record),
            Phase::Vm => forward!("probe::vm", record),
            Phase::Api => forward!("probe::api", record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_of() {
        assert_eq!(phase_of("probe_core::inspect::resolve"), Phase::Resolve);
        assert_eq!(phase_of("probe_core::inspect::trace"), Phase::Trace);
        assert_eq!(phase_of("probe_core::inspect::attrs"), Phase::Attrs);
        assert_eq!(phase_of("probe_core::inspect::format"), Phase::Format);
        assert_eq!(phase_of("probe_core::vm"), Phase::Vm);
        assert_eq!(phase_of("probe_api::session"), Phase::Api);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_tracing_sink_without_subscriber() {
        let sink = TracingSink;
        sink.write(&Record::new(probe_log::Level::Info, "probe_core::vm", "hello"));
    }
}
