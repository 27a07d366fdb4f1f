//! Probe CLI - inspect a paused interpreter snapshot
//!
//! 快照是一份 JSON 文件，描述暂停时的全局变量、类型、对象和调用帧。

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

mod config;
mod logging;
mod platform;

use crate::config::{parse_log_level, to_probe_level, FileConfig};
use crate::logging::{LogFormat, TracingSink};
use crate::platform::{print_error, print_variable, ConsoleAttributes};
use probe_api::{
    get_config, init_config, FieldSink, ProbeError, Session, SessionConfig, TraceReport,
};
use probe_log::Logger;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<FormatArg> for LogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pretty => LogFormat::Pretty,
            FormatArg::Compact => LogFormat::Compact,
            FormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "probe",
    about = "Inspect variables and call stacks of a paused interpreter snapshot",
    version = "0.1.0"
)]
struct Cli {
    /// Snapshot file (JSON)
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Configuration file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    #[arg(long)]
    log_level: Option<String>,

    /// 日志格式
    #[arg(long, value_enum, default_value = "compact")]
    log_format: FormatArg,

    /// 同时写入日志文件
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// 错误以 JSON 报告输出
    #[arg(long)]
    json_errors: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the call stack, innermost frame first
    Trace {
        #[arg(long)]
        max_frames: Option<usize>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve a dotted path and display its value
    Get {
        path: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        no_fast_path: bool,
        #[arg(long)]
        max_segment: Option<usize>,
    },
    /// List attributes of a value, or locals when no path is given
    Ls {
        #[arg(default_value = "")]
        path: String,
        #[arg(long)]
        max: Option<usize>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match FileConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => FileConfig::default(),
    };

    let mut log_config = match file_config.log_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Some(level) = &cli.log_level {
        match parse_log_level(level) {
            Some(level) => log_config.global = level,
            None => {
                eprintln!("Error: 未知日志级别 '{}'", level);
                process::exit(1);
            }
        }
    }

    if let Err(e) =
        logging::init_with_file(&log_config, cli.log_format.into(), cli.log_file.as_ref())
    {
        eprintln!("Error: 无法初始化日志: {}", e);
        process::exit(1);
    }

    let logger = Logger::new(to_probe_level(log_config.max_level())).with_sink(TracingSink);
    let mut session_config = SessionConfig {
        inspect: file_config.inspect.clone(),
        limits: file_config.limits.clone(),
        logger: Arc::clone(&logger),
    };
    apply_overrides(&mut session_config, &cli.command);

    // Initialize API config (global singleton for convenience)
    if init_config(session_config).is_err() {
        eprintln!("Error: 配置已初始化");
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        print_error(&e, cli.json_errors);
        process::exit(1);
    }
}

/// 命令行参数覆盖配置文件
fn apply_overrides(config: &mut SessionConfig, command: &Command) {
    match command {
        Command::Trace { max_frames, .. } => {
            if let Some(max) = max_frames {
                config.inspect.max_frames = *max;
            }
        }
        Command::Get {
            timeout_ms,
            no_fast_path,
            max_segment,
            ..
        } => {
            if let Some(ms) = timeout_ms {
                config.inspect.value_timeout_ms = *ms;
            }
            if *no_fast_path {
                config.inspect.numeric_fast_path = false;
            }
            if let Some(max) = max_segment {
                config.inspect.max_segment_length = *max;
            }
        }
        Command::Ls { max, .. } => {
            if let Some(max) = max {
                config.inspect.max_attributes = *max;
            }
        }
    }
}

fn run(cli: &Cli) -> Result<(), ProbeError> {
    let mut session = Session::load(&cli.snapshot, get_config().clone())?;
    let result = execute(&mut session, &cli.command);
    session.resume();
    result
}

fn execute(session: &mut Session, command: &Command) -> Result<(), ProbeError> {
    match command {
        Command::Trace { json, .. } => {
            let trace = session.try_stack_trace()?;
            let report = TraceReport::from(&trace);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Traceback (most recent call first):");
                print!("{}", report);
            }
        }
        Command::Get { path, .. } => {
            let limits = session.config().limits.clone();
            let mut fields = FieldSink::new(limits.type_text_capacity, limits.value_text_capacity);
            let rendered = session.try_inspect(path, &mut fields)?;
            print_variable(path, &fields, rendered)?;
        }
        Command::Ls { path, skip, .. } => {
            let mut sink = ConsoleAttributes::new(std::io::stdout().lock());
            session.try_list_attributes(path, &mut sink, *skip)?;
            sink.finish()?;
        }
    }
    Ok(())
}
