//! 暂停态自省
//!
//! 解释器暂停时，宿主通过 `PausedVm` 读取变量、列举属性、重建调用栈。
//! 同一时刻只允许一个自省调用在执行（`AccessGuard`）；期间产生的显示
//! 文本保存在 `DisplayStrings` 中，直到 `resume()` 才统一释放。

pub mod attrs;
pub mod error;
pub mod format;
pub mod path;
pub mod resolve;
pub mod sink;
pub mod trace;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use probe_config::InspectConfig;
use probe_log::{debug, trace, Logger};

use crate::cancel::CancelToken;
use crate::frame::FrameId;
use crate::interp::Interpreter;
use crate::scope::Scope;
use crate::value::Value;

pub use attrs::Page;
pub use error::InspectError;
pub use format::{DisplayOptions, Rendered};
pub use sink::{AttributeSink, BoundedText, FieldSink, LookupSink, SinkEvent, Transcript};
pub use trace::{StackTrace, TraceFrame};

/// 待释放的显示文本
///
/// 自省过程中交给宿主的文本都登记在这里，恢复执行时一次性释放。
#[derive(Debug, Default)]
pub struct DisplayStrings {
    pending: Mutex<Vec<Arc<str>>>,
}

impl DisplayStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一段文本，返回共享句柄
    pub fn retain(&self, text: impl Into<Arc<str>>) -> Arc<str> {
        let text = text.into();
        self.list().push(Arc::clone(&text));
        text
    }

    pub fn pending(&self) -> usize {
        self.list().len()
    }

    /// 释放全部待释放文本，返回数量
    pub fn release_all(&self) -> usize {
        let mut pending = self.list();
        let count = pending.len();
        pending.clear();
        count
    }

    // 列表只做追加和清空，锁中毒后内容仍然有效
    fn list(&self) -> std::sync::MutexGuard<'_, Vec<Arc<str>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 单次自省调用的访问守卫，离开作用域时清除占用标志
#[derive(Debug)]
pub struct AccessGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 暂停中的解释器上下文
#[derive(Debug)]
pub struct PausedVm {
    paused: bool,
    active_frame: Option<FrameId>,
    active_scope: Option<Arc<Scope>>,
    in_flight: AtomicBool,
    display: DisplayStrings,
    attribute_timeout_ms: u64,
    logger: Arc<Logger>,
}

impl PausedVm {
    /// 初始为运行态
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            paused: false,
            active_frame: None,
            active_scope: None,
            in_flight: AtomicBool::new(false),
            display: DisplayStrings::new(),
            attribute_timeout_ms: InspectConfig::default().value_timeout_ms,
            logger,
        }
    }

    /// 单次调用中属性读取（含计算属性）的总时限
    pub fn set_attribute_timeout(&mut self, timeout_ms: u64) {
        self.attribute_timeout_ms = timeout_ms;
    }

    pub fn attribute_timeout(&self) -> u64 {
        self.attribute_timeout_ms
    }

    /// 本次调用的属性读取令牌：外部中止加上时限
    pub(crate) fn attribute_token<I: Interpreter + ?Sized>(&self, vm: &I) -> CancelToken {
        let deadline = vm.ticks_ms().saturating_add(self.attribute_timeout_ms);
        vm.cancel_token().with_deadline(deadline)
    }

    /// 在 `frame` 处暂停，`scope` 为当前作用域
    pub fn pause(&mut self, frame: FrameId, scope: Arc<Scope>) {
        debug!(self.logger, "paused at frame {}", frame.0);
        self.paused = true;
        self.active_frame = Some(frame);
        self.active_scope = Some(scope);
    }

    /// 在当前帧自身的作用域暂停；帧不存在时返回 false
    pub fn pause_at<I: Interpreter + ?Sized>(&mut self, vm: &I, frame: FrameId) -> bool {
        match vm.frames().get(frame) {
            Some(f) => {
                let scope = Arc::clone(&f.scope);
                self.pause(frame, scope);
                true
            }
            None => false,
        }
    }

    /// 恢复执行，释放全部显示文本
    pub fn resume(&mut self) -> usize {
        self.paused = false;
        self.active_frame = None;
        self.active_scope = None;
        let released = self.display.release_all();
        debug!(self.logger, "resumed, released {} display strings", released);
        released
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_frame(&self) -> Option<FrameId> {
        self.active_frame
    }

    pub fn active_scope(&self) -> Option<&Arc<Scope>> {
        self.active_scope.as_ref()
    }

    pub fn display(&self) -> &DisplayStrings {
        &self.display
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// 是否有自省调用正在执行
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 开始一次自省调用：检查暂停状态并占用单飞标志
    pub fn begin_access(&self) -> Result<AccessGuard<'_>, InspectError> {
        if !self.paused {
            trace!(self.logger, "rejected: not paused");
            return Err(InspectError::NotPaused);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(self.logger, "rejected: another call in flight");
            return Err(InspectError::Busy);
        }
        Ok(AccessGuard {
            flag: &self.in_flight,
        })
    }

    // ===== 自省操作 =====

    /// 按点分路径解析变量
    pub fn resolve<I: Interpreter + ?Sized>(
        &self,
        vm: &mut I,
        path: &str,
        max_segment_length: usize,
    ) -> Result<Value, InspectError> {
        let _guard = self.begin_access()?;
        let _op = self.logger.operation("resolve");
        resolve::resolve_path(self, vm, path, max_segment_length)
    }

    /// 解析变量并通过回调显示
    pub fn inspect_variable<I: Interpreter + ?Sized>(
        &self,
        vm: &mut I,
        path: &str,
        max_segment_length: usize,
        sink: &mut dyn LookupSink,
        options: &DisplayOptions,
    ) -> Result<Rendered, InspectError> {
        let _guard = self.begin_access()?;
        let _op = self.logger.operation("inspect_variable");
        let value = resolve::resolve_path(self, vm, path, max_segment_length)?;
        let scope = self.active_scope.as_ref().ok_or(InspectError::NoActiveScope)?;
        Ok(format::render(self, vm, &value, scope, sink, options))
    }

    /// 列举属性；空路径列举当前作用域的符号
    pub fn list_attributes<I: Interpreter + ?Sized>(
        &self,
        vm: &mut I,
        path: &str,
        max_segment_length: usize,
        sink: &mut dyn AttributeSink,
        page: Page,
    ) -> Result<usize, InspectError> {
        let _guard = self.begin_access()?;
        let _op = self.logger.operation("list_attributes");
        if path.is_empty() {
            let scope = self.active_scope.as_ref().ok_or(InspectError::NoActiveScope)?;
            return Ok(attrs::list_local(self, vm, scope, sink, page));
        }
        let value = resolve::resolve_path(self, vm, path, max_segment_length)?;
        Ok(attrs::list_value(self, vm, &value, sink, page))
    }

    /// 从当前帧向外重建调用栈
    pub fn stack_trace<I: Interpreter + ?Sized>(
        &self,
        vm: &I,
        max_frames: usize,
    ) -> Result<StackTrace, InspectError> {
        let _guard = self.begin_access()?;
        let _op = self.logger.operation("stack_trace");
        Ok(trace::stack_trace(self, vm, max_frames))
    }
}

impl From<&InspectConfig> for DisplayOptions {
    fn from(config: &InspectConfig) -> Self {
        Self {
            numeric_fast_path: config.numeric_fast_path,
            timeout_ms: config.value_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bytecode::CodeBuilder;

    fn scope() -> Arc<Scope> {
        let code = CodeBuilder::new(Atom(1), Atom(2)).build();
        Arc::new(Scope::new(Atom(2), vec![], Arc::new(code)))
    }

    #[test]
    fn test_display_strings_survive_poisoned_lock() {
        let strings = Arc::new(DisplayStrings::new());
        strings.retain("before");
        let shared = Arc::clone(&strings);
        let poisoned = std::thread::spawn(move || {
            let _pending = shared.pending.lock().unwrap();
            panic!("poison the pending list");
        })
        .join();
        assert!(poisoned.is_err());
        assert!(strings.pending.is_poisoned());

        let text = strings.retain("after");
        assert_eq!(&*text, "after");
        assert_eq!(strings.pending(), 2);
        assert_eq!(strings.release_all(), 2);
        assert_eq!(strings.pending(), 0);
    }

    #[test]
    fn test_not_paused_rejects() {
        let vm = PausedVm::new(Logger::noop());
        assert_eq!(vm.begin_access().unwrap_err(), InspectError::NotPaused);
    }

    #[test]
    fn test_guard_single_flight() {
        let mut vm = PausedVm::new(Logger::noop());
        vm.pause(FrameId(0), scope());
        let guard = vm.begin_access().unwrap();
        assert!(vm.is_busy());
        assert_eq!(vm.begin_access().unwrap_err(), InspectError::Busy);
        drop(guard);
        assert!(!vm.is_busy());
        assert!(vm.begin_access().is_ok());
    }

    #[test]
    fn test_resume_releases_display_strings() {
        let mut vm = PausedVm::new(Logger::noop());
        vm.pause(FrameId(0), scope());
        let text = vm.display().retain("Motor(3)");
        vm.display().retain(String::from("int"));
        assert_eq!(vm.display().pending(), 2);
        assert_eq!(&*text, "Motor(3)");
        assert_eq!(vm.resume(), 2);
        assert_eq!(vm.display().pending(), 0);
        assert!(!vm.is_paused());
        assert_eq!(vm.resume(), 0);
    }

    #[test]
    fn test_display_options_from_config() {
        let config = InspectConfig {
            value_timeout_ms: 50,
            numeric_fast_path: false,
            ..InspectConfig::default()
        };
        let options = DisplayOptions::from(&config);
        assert_eq!(options.timeout_ms, 50);
        assert!(!options.numeric_fast_path);
    }
}
