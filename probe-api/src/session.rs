//! 自省会话
//!
//! 持有暂停中的解释器和自省上下文，对宿主暴露哨兵值风格的入口
//! （`bool` / `-1`），同时为库用户提供返回 `Result` 的版本。

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use probe_core::inspect::{AttributeSink, LookupSink, Page, PausedVm, Rendered, StackTrace};
use probe_core::{DisplayOptions, Machine, TraceFrame, Value};
use probe_log::{debug, info, trace};

use crate::config::SessionConfig;
use crate::error::ProbeError;
use crate::snapshot::Snapshot;

/// 暂停态自省会话
pub struct Session {
    vm: Machine,
    state: PausedVm,
    config: SessionConfig,
}

impl Session {
    pub fn new(vm: Machine, state: PausedVm, config: SessionConfig) -> Self {
        Self { vm, state, config }
    }

    /// 从快照构建会话
    pub fn from_snapshot(snapshot: &Snapshot, config: SessionConfig) -> Result<Self, ProbeError> {
        let mut machine = Machine::new(Arc::clone(&config.logger));
        machine.set_max_depth(config.limits.max_call_depth);
        let loaded = snapshot.build(machine, &config.logger)?;
        let mut state = PausedVm::new(Arc::clone(&config.logger));
        state.set_attribute_timeout(config.inspect.value_timeout_ms);
        if let Some(frame) = loaded.paused_at {
            state.pause_at(&loaded.machine, frame);
        }
        info!(
            config.logger,
            "session ready (paused: {})",
            state.is_paused()
        );
        Ok(Self::new(loaded.machine, state, config))
    }

    pub fn from_json(text: &str, config: SessionConfig) -> Result<Self, ProbeError> {
        Self::from_snapshot(&Snapshot::from_json(text)?, config)
    }

    pub fn load(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self, ProbeError> {
        Self::from_snapshot(&Snapshot::load(path)?, config)
    }

    pub fn machine(&self) -> &Machine {
        &self.vm
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.vm
    }

    pub fn state(&self) -> &PausedVm {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// 外部中止句柄
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        self.vm.abort_handle()
    }

    // ===== 宿主入口 =====

    /// 解析并显示变量；未暂停、重入、超长或找不到时返回 false
    pub fn resolve_variable(
        &mut self,
        path: &str,
        max_segment_length: usize,
        sinks: &mut dyn LookupSink,
        numeric_fast_path: bool,
        timeout_ms: u64,
    ) -> bool {
        let options = DisplayOptions {
            numeric_fast_path,
            timeout_ms,
        };
        match self
            .state
            .inspect_variable(&mut self.vm, path, max_segment_length, sinks, &options)
        {
            Ok(rendered) => {
                trace!(self.config.logger, "'{}' rendered as {:?}", path, rendered);
                true
            }
            Err(err) => {
                debug!(self.config.logger, "resolve '{}' failed: {}", path, err);
                false
            }
        }
    }

    /// 列举属性；返回输出条数，出错返回 -1
    pub fn list_attributes(
        &mut self,
        path: &str,
        max_segment_length: usize,
        sinks: &mut dyn AttributeSink,
        max_count: usize,
        skip: usize,
    ) -> i64 {
        let page = Page::new(max_count, skip);
        match self
            .state
            .list_attributes(&mut self.vm, path, max_segment_length, sinks, page)
        {
            Ok(count) => count as i64,
            Err(err) => {
                debug!(self.config.logger, "list '{}' failed: {}", path, err);
                -1
            }
        }
    }

    /// 调用栈
    ///
    /// 未暂停或有调用在执行时同样返回 `(空, false)`，与没有调用链无法区分；
    /// 需要区分时用 `try_stack_trace`。
    pub fn get_stack_trace(&self, max_frames: usize) -> (Vec<TraceFrame>, bool) {
        match self.state.stack_trace(&self.vm, max_frames) {
            Ok(trace) => (trace.frames, trace.truncated),
            Err(err) => {
                debug!(self.config.logger, "stack trace unavailable: {}", err);
                (Vec::new(), false)
            }
        }
    }

    /// 恢复执行，释放显示文本
    pub fn resume(&mut self) -> usize {
        self.vm.clear_abort();
        self.state.resume()
    }

    // ===== 库入口（使用会话配置的默认值） =====

    pub fn try_resolve(&mut self, path: &str) -> Result<Value, ProbeError> {
        let max = self.config.inspect.max_segment_length;
        Ok(self.state.resolve(&mut self.vm, path, max)?)
    }

    pub fn try_inspect(
        &mut self,
        path: &str,
        sinks: &mut dyn LookupSink,
    ) -> Result<Rendered, ProbeError> {
        let max = self.config.inspect.max_segment_length;
        let options = DisplayOptions::from(&self.config.inspect);
        Ok(self
            .state
            .inspect_variable(&mut self.vm, path, max, sinks, &options)?)
    }

    pub fn try_list_attributes(
        &mut self,
        path: &str,
        sinks: &mut dyn AttributeSink,
        skip: usize,
    ) -> Result<usize, ProbeError> {
        let max = self.config.inspect.max_segment_length;
        let page = Page::new(self.config.inspect.max_attributes, skip);
        Ok(self
            .state
            .list_attributes(&mut self.vm, path, max, sinks, page)?)
    }

    pub fn try_stack_trace(&self) -> Result<StackTrace, ProbeError> {
        Ok(self
            .state
            .stack_trace(&self.vm, self.config.inspect.max_frames)?)
    }
}
