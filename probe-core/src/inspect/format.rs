//! 输出格式化
//!
//! 回调顺序：类型、终止、分隔、值、终止、分隔、作用域名（走类型回调）、终止。
//! 浮点快速通道：浮点、分隔、作用域名、终止。
//!
//! 自定义描述方法是用户代码，带截止时间运行；输出先写入缓冲区，成功后
//! 才交给宿主。超时则发出超时信号并丢弃缓冲区。

use std::sync::Arc;

use probe_log::{debug, trace};

use super::sink::LookupSink;
use super::PausedVm;
use crate::interp::{Interpreter, Unwind};
use crate::scope::Scope;
use crate::value::Value;

/// 显示选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// 浮点数直接走数值回调
    pub numeric_fast_path: bool,
    /// 描述方法的时间预算
    pub timeout_ms: u64,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            numeric_fast_path: true,
            timeout_ms: 100,
        }
    }
}

/// 显示结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    /// 值已完整输出
    Complete,
    /// 浮点快速通道
    Numeric,
    /// 类型没有描述能力，输出 `<T object>`
    Opaque,
    /// 描述方法抛出异常，输出兜底文本
    Failed,
    /// 描述方法超时或被中止
    TimedOut,
}

pub(crate) fn render<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &mut I,
    value: &Value,
    scope: &Scope,
    sink: &mut dyn LookupSink,
    options: &DisplayOptions,
) -> Rendered {
    let rendered = match value {
        Value::Float(x) if options.numeric_fast_path => {
            sink.float(*x);
            Rendered::Numeric
        }
        Value::Undefined => {
            sink.type_name("undefined");
            sink.terminator();
            sink.separator();
            sink.value("undefined");
            sink.terminator();
            Rendered::Complete
        }
        _ => {
            let type_name: Arc<str> = state.display().retain(vm.type_name(value));
            sink.type_name(&type_name);
            sink.terminator();
            sink.separator();
            render_value(state, vm, value, &type_name, sink, options)
        }
    };

    sink.separator();
    let scope_name = vm.atoms().name(scope.simple_name);
    sink.type_name(scope_name);
    sink.terminator();
    rendered
}

fn render_value<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &mut I,
    value: &Value,
    type_name: &str,
    sink: &mut dyn LookupSink,
    options: &DisplayOptions,
) -> Rendered {
    if !vm.can_describe(value) {
        let text = state.display().retain(format!("<{} object>", type_name));
        sink.value(&text);
        sink.terminator();
        return Rendered::Opaque;
    }

    let deadline = vm.ticks_ms().saturating_add(options.timeout_ms);
    let token = vm.cancel_token().with_deadline(deadline);
    let mut buffer = String::new();

    match vm.describe(value, &mut buffer, &token) {
        Ok(()) => {
            let text = state.display().retain(buffer);
            sink.value(&text);
            sink.terminator();
            Rendered::Complete
        }
        Err(Unwind::Abort) => {
            debug!(
                state.logger(),
                "describe of {} aborted after {}ms, discarding {} bytes",
                type_name,
                options.timeout_ms,
                buffer.len()
            );
            sink.timeout();
            Rendered::TimedOut
        }
        Err(Unwind::Raise(exception)) => {
            trace!(state.logger(), "describe of {} raised {}", type_name, exception.kind);
            vm.report_uncaught(&exception);
            let text = state
                .display()
                .retain(format!("<{} object> [Error stringifying type]", type_name));
            sink.value(&text);
            sink.terminator();
            Rendered::Failed
        }
    }
}
