//! 参考解释器
//!
//! 只实现自省层需要的那部分解释器：对象堆、驻留名字表、全局命名空间、
//! 帧存储、单调时钟，以及用操作序列表示的用户代码。
//! 没有解析器和编译器。

pub mod heap;
pub mod routine;

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use probe_config::LimitConfig;
use probe_log::{debug, trace, warn, Logger};

use crate::atom::{Atom, AtomTable};
use crate::cancel::{CancelToken, Checkpoint, Clock, SystemClock};
use crate::frame::{Frame, FrameArena, FrameId};
use crate::interp::{Interpreter, Unwind};
use crate::report::{format_exception, Exception, TracebackEntry};
use crate::value::Value;

pub use heap::{Builtins, Heap, HeapObject, TypeId, TypeInfo};
pub use routine::{Op, Routine};

/// 参考解释器
pub struct Machine {
    atoms: AtomTable,
    heap: Heap,
    globals: HashMap<Atom, Value>,
    frames: FrameArena,
    clock: Arc<dyn Clock>,
    abort: Arc<AtomicBool>,
    source_file: Arc<str>,
    uncaught: Vec<String>,
    depth: usize,
    max_depth: usize,
    logger: Arc<Logger>,
}

impl Machine {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self::with_clock(Arc::new(SystemClock::new()), logger)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, logger: Arc<Logger>) -> Self {
        let mut atoms = AtomTable::new();
        let heap = Heap::new(&mut atoms);
        Self {
            atoms,
            heap,
            globals: HashMap::new(),
            frames: FrameArena::new(),
            clock,
            abort: Arc::new(AtomicBool::new(false)),
            source_file: Arc::from("<stdin>"),
            uncaught: Vec::new(),
            depth: 0,
            max_depth: LimitConfig::default().max_call_depth,
            logger,
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 例程嵌套上限，超过时抛出 RuntimeError
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// 当前例程嵌套深度
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// 例程回溯条目使用的文件名
    pub fn set_source_file(&mut self, file: &str) {
        self.source_file = Arc::from(file);
    }

    pub fn intern(&mut self, name: &str) -> Atom {
        self.atoms.intern(name)
    }

    pub fn frames_mut(&mut self) -> &mut FrameArena {
        &mut self.frames
    }

    pub fn push_frame(&mut self, frame: Frame) -> FrameId {
        self.frames.push(frame)
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        let atom = self.atoms.intern(name);
        self.globals.insert(atom, value);
    }

    // ===== 类型与对象 =====

    pub fn define_type(&mut self, name: &str) -> TypeId {
        let atom = self.atoms.intern(name);
        self.heap.define_type(atom)
    }

    pub fn set_class_attr(&mut self, ty: TypeId, name: &str, value: Value) {
        let atom = self.atoms.intern(name);
        if let Some(info) = self.heap.type_info_mut(ty) {
            info.attrs.insert(atom, value);
        }
    }

    pub fn set_property(&mut self, ty: TypeId, name: &str, routine: Routine) {
        let atom = self.atoms.intern(name);
        if let Some(info) = self.heap.type_info_mut(ty) {
            info.properties.insert(atom, routine);
        }
    }

    pub fn set_describe(&mut self, ty: TypeId, routine: Routine) {
        if let Some(info) = self.heap.type_info_mut(ty) {
            info.describe = Some(routine);
        }
    }

    pub fn new_instance(&mut self, ty: TypeId) -> Value {
        Value::Object(self.heap.alloc(HeapObject::Instance {
            ty,
            attrs: HashMap::new(),
        }))
    }

    /// 设置实例属性；目标不是实例时忽略并返回 false
    pub fn set_attr(&mut self, target: &Value, name: &str, value: Value) -> bool {
        let atom = self.atoms.intern(name);
        let Value::Object(obj) = target else {
            return false;
        };
        match self.heap.get_mut(*obj) {
            Some(HeapObject::Instance { attrs, .. }) => {
                attrs.insert(atom, value);
                true
            }
            _ => false,
        }
    }

    pub fn new_cell(&mut self, value: Value) -> Value {
        Value::Cell(self.heap.alloc(HeapObject::Cell(value)))
    }

    // ===== 执行 =====

    /// 外部中止句柄：置位后下一个延时检查点展开
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// 清除中止请求
    pub fn clear_abort(&self) {
        self.abort.store(false, Ordering::SeqCst);
    }

    /// 已报告的未捕获异常文本
    pub fn uncaught_reports(&self) -> &[String] {
        &self.uncaught
    }

    /// 延时原语，也是唯一的取消检查点
    pub fn delay_ms(&self, ms: u64, token: &CancelToken) -> Result<(), Unwind> {
        match token.checkpoint(self.clock.ticks_ms(), ms) {
            Checkpoint::Continue => {
                self.clock.sleep_ms(ms);
                Ok(())
            }
            Checkpoint::SleepThenAbort(remaining) => {
                self.clock.sleep_ms(remaining);
                debug!(self.logger, "delay of {}ms cut short after {}ms", ms, remaining);
                Err(Unwind::Abort)
            }
            Checkpoint::Abort => {
                debug!(self.logger, "delay of {}ms aborted at checkpoint", ms);
                Err(Unwind::Abort)
            }
        }
    }

    /// 运行例程，`out` 为描述输出；无返回值时得到 None
    pub fn run_routine(
        &mut self,
        routine: &Routine,
        this: &Value,
        out: Option<&mut String>,
        token: &CancelToken,
    ) -> Result<Value, Unwind> {
        trace!(self.logger, "run routine {}", self.atoms.name(routine.name));
        if self.depth >= self.max_depth {
            debug!(self.logger, "routine nesting exceeded {}", self.max_depth);
            return Err(Unwind::Raise(Exception::new(
                "RuntimeError",
                "maximum recursion depth exceeded",
            )));
        }
        let ops = Arc::clone(&routine.ops);
        let mut out = out;
        self.depth += 1;
        let result = self.exec(&ops, this, &mut out, token);
        self.depth -= 1;
        match result {
            Ok(value) => Ok(value.unwrap_or(Value::None)),
            Err(Unwind::Raise(exception)) => {
                let block = self
                    .atoms
                    .get(routine.name)
                    .cloned()
                    .unwrap_or_else(|| Arc::from("?"));
                Err(Unwind::Raise(exception.with_entry(TracebackEntry {
                    file: Arc::clone(&self.source_file),
                    line: routine.line,
                    block,
                })))
            }
            Err(Unwind::Abort) => Err(Unwind::Abort),
        }
    }

    fn exec(
        &mut self,
        ops: &[Op],
        this: &Value,
        out: &mut Option<&mut String>,
        token: &CancelToken,
    ) -> Result<Option<Value>, Unwind> {
        for op in ops {
            match op {
                Op::Write(text) => {
                    if let Some(out) = out.as_deref_mut() {
                        out.push_str(text);
                    }
                }
                Op::WriteAttr(name) => {
                    let value = self.attribute_load(this, *name, token)?;
                    let mut text = String::new();
                    self.describe(&value, &mut text, token)?;
                    if let Some(out) = out.as_deref_mut() {
                        out.push_str(&text);
                    }
                }
                Op::Sleep(ms) => self.delay_ms(*ms, token)?,
                Op::Spin(ms) => self.clock.sleep_ms(*ms),
                Op::Raise { kind, message } => {
                    return Err(Unwind::Raise(Exception::new(kind, message.clone())));
                }
                Op::Return(value) => return Ok(Some(value.clone())),
                Op::Repeat(body) => loop {
                    if let Some(value) = self.exec(body, this, out, token)? {
                        return Ok(Some(value));
                    }
                },
            }
        }
        Ok(None)
    }

    fn type_info_of(&self, value: &Value) -> Option<&TypeInfo> {
        self.heap
            .type_of(value)
            .and_then(|ty| self.heap.type_info(ty))
    }
}

impl Interpreter for Machine {
    fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    fn frames(&self) -> &FrameArena {
        &self.frames
    }

    fn global_load(&self, name: Atom) -> Result<Value, Exception> {
        self.globals.get(&name).cloned().ok_or_else(|| {
            Exception::new(
                "NameError",
                format!("name '{}' isn't defined", self.atoms.name(name)),
            )
        })
    }

    fn attribute_load(
        &mut self,
        target: &Value,
        name: Atom,
        token: &CancelToken,
    ) -> Result<Value, Unwind> {
        if let Value::Object(obj) = target {
            if let Some(value) = self.heap.instance_attr(*obj, name) {
                return Ok(value.clone());
            }
        }

        let mut property = None;
        if let Some(info) = self.type_info_of(target) {
            if let Some(value) = info.attrs.get(&name) {
                return Ok(value.clone());
            }
            property = info.properties.get(&name).cloned();
        }
        if let Some(routine) = property {
            return self.run_routine(&routine, target, None, token);
        }

        Err(Unwind::Raise(Exception::new(
            "AttributeError",
            format!(
                "'{}' object has no attribute '{}'",
                self.type_name(target),
                self.atoms.name(name)
            ),
        )))
    }

    fn cell_get(&self, cell: &Value) -> Option<Value> {
        match cell {
            Value::Cell(obj) => self.heap.cell_contents(*obj).cloned(),
            _ => None,
        }
    }

    fn type_name(&self, value: &Value) -> &str {
        match self.type_info_of(value) {
            Some(info) => self.atoms.name(info.name),
            None => "undefined",
        }
    }

    fn can_describe(&self, value: &Value) -> bool {
        match value {
            Value::Undefined => false,
            Value::Object(_) => self
                .type_info_of(value)
                .is_some_and(|info| info.describe.is_some()),
            _ => true,
        }
    }

    fn describe(
        &mut self,
        value: &Value,
        out: &mut String,
        token: &CancelToken,
    ) -> Result<(), Unwind> {
        match value {
            Value::Object(_) => {
                let describe = self.type_info_of(value).and_then(|info| info.describe.clone());
                match describe {
                    Some(routine) => {
                        self.run_routine(&routine, value, Some(out), token)?;
                    }
                    None => {
                        let _ = write!(out, "<{} object>", self.type_name(value));
                    }
                }
            }
            Value::Native(name) => {
                let _ = write!(out, "<function {}>", self.atoms.name(*name));
            }
            Value::Cell(_) => out.push_str("<cell>"),
            other => {
                let _ = write!(out, "{}", other);
            }
        }
        Ok(())
    }

    fn ticks_ms(&self) -> u64 {
        self.clock.ticks_ms()
    }

    fn cancel_token(&self) -> CancelToken {
        CancelToken::with_abort(Arc::clone(&self.abort))
    }

    fn report_uncaught(&mut self, exception: &Exception) {
        let text = format_exception(exception);
        warn!(self.logger, "uncaught exception: {}", text.trim_end());
        self.uncaught.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::ManualClock;

    fn machine() -> (Machine, ManualClock) {
        let clock = ManualClock::new(0);
        let vm = Machine::with_clock(Arc::new(clock.clone()), Logger::noop());
        (vm, clock)
    }

    #[test]
    fn test_global_load() {
        let (mut vm, _) = machine();
        vm.set_global("limit", Value::Int(9));
        let limit = vm.intern("limit");
        assert_eq!(vm.global_load(limit).unwrap(), Value::Int(9));
        let missing = vm.intern("missing");
        let err = vm.global_load(missing).unwrap_err();
        assert_eq!(&*err.kind, "NameError");
    }

    #[test]
    fn test_attribute_lookup_order() {
        let (mut vm, _) = machine();
        let ty = vm.define_type("Motor");
        vm.set_class_attr(ty, "speed", Value::Int(1));
        let motor = vm.new_instance(ty);
        let speed = vm.intern("speed");
        let token = CancelToken::none();
        assert_eq!(vm.attribute_load(&motor, speed, &token).unwrap(), Value::Int(1));
        vm.set_attr(&motor, "speed", Value::Int(5));
        assert_eq!(vm.attribute_load(&motor, speed, &token).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_missing_attribute_raises() {
        let (mut vm, _) = machine();
        let name = vm.intern("nope");
        let err = vm
            .attribute_load(&Value::Int(1), name, &CancelToken::none())
            .unwrap_err();
        match err {
            Unwind::Raise(exc) => {
                assert_eq!(&*exc.kind, "AttributeError");
                assert!(exc.message.contains("'int'"));
            }
            Unwind::Abort => panic!("expected raise"),
        }
    }

    #[test]
    fn test_property_runs_routine() {
        let (mut vm, _) = machine();
        let ty = vm.define_type("Sensor");
        let name = vm.intern("reading");
        vm.set_property(ty, "reading", Routine::new(name, vec![Op::Sleep(5), Op::Return(Value::Float(2.5))]));
        let sensor = vm.new_instance(ty);
        let value = vm.attribute_load(&sensor, name, &CancelToken::none()).unwrap();
        assert_eq!(value, Value::Float(2.5));
        assert_eq!(vm.ticks_ms(), 5);
    }

    #[test]
    fn test_raising_property_records_traceback() {
        let (mut vm, _) = machine();
        vm.set_source_file("main.py");
        let ty = vm.define_type("Sensor");
        let name = vm.intern("broken");
        let routine = Routine::new(
            name,
            vec![Op::Raise {
                kind: "ValueError".into(),
                message: "bad".into(),
            }],
        )
        .at_line(7);
        vm.set_property(ty, "broken", routine);
        let sensor = vm.new_instance(ty);
        let Err(Unwind::Raise(exc)) = vm.attribute_load(&sensor, name, &CancelToken::none()) else {
            panic!("expected raise");
        };
        assert_eq!(exc.traceback.len(), 1);
        assert_eq!(&*exc.traceback[0].file, "main.py");
        assert_eq!(exc.traceback[0].line, 7);
    }

    #[test]
    fn test_delay_checkpoint() {
        let (vm, clock) = machine();
        let token = CancelToken::none().with_deadline(50);
        assert_eq!(vm.delay_ms(20, &token), Ok(()));
        assert_eq!(clock.ticks_ms(), 20);
        assert_eq!(vm.delay_ms(100, &token), Err(Unwind::Abort));
        assert_eq!(clock.ticks_ms(), 50);
        assert_eq!(vm.delay_ms(1, &token), Err(Unwind::Abort));
        assert_eq!(clock.ticks_ms(), 50);
    }

    #[test]
    fn test_describe_loop_aborts_at_deadline() {
        let (mut vm, clock) = machine();
        let ty = vm.define_type("Spinner");
        let name = vm.intern("__str__");
        vm.set_describe(ty, Routine::new(name, vec![Op::Write("x".into()), Op::Repeat(vec![Op::Sleep(10)])]));
        let spinner = vm.new_instance(ty);
        let token = vm.cancel_token().with_deadline(35);
        let mut out = String::new();
        assert_eq!(vm.describe(&spinner, &mut out, &token), Err(Unwind::Abort));
        assert_eq!(clock.ticks_ms(), 35);
    }

    #[test]
    fn test_abort_handle() {
        let (mut vm, _) = machine();
        let ty = vm.define_type("Spinner");
        let name = vm.intern("__str__");
        vm.set_describe(ty, Routine::new(name, vec![Op::Repeat(vec![Op::Sleep(1)])]));
        let spinner = vm.new_instance(ty);
        vm.abort_handle().store(true, Ordering::SeqCst);
        let token = vm.cancel_token();
        let mut out = String::new();
        assert_eq!(vm.describe(&spinner, &mut out, &token), Err(Unwind::Abort));
        vm.clear_abort();
        assert!(!vm.cancel_token().is_aborted());
    }

    #[test]
    fn test_describe_builtins() {
        let (mut vm, _) = machine();
        let token = CancelToken::none();
        let mut out = String::new();
        vm.describe(&Value::Float(2.0), &mut out, &token).unwrap();
        assert_eq!(out, "2.0");
        let ty = vm.define_type("Plain");
        let plain = vm.new_instance(ty);
        assert!(!vm.can_describe(&plain));
        assert!(vm.can_describe(&Value::Int(3)));
        assert!(!vm.can_describe(&Value::Undefined));
        assert_eq!(vm.type_name(&Value::Undefined), "undefined");
    }

    #[test]
    fn test_describe_with_attr() {
        let (mut vm, _) = machine();
        let ty = vm.define_type("Motor");
        let speed = vm.intern("speed");
        let name = vm.intern("__str__");
        vm.set_describe(
            ty,
            Routine::new(name, vec![Op::Write("Motor(".into()), Op::WriteAttr(speed), Op::Write(")".into())]),
        );
        let motor = vm.new_instance(ty);
        vm.set_attr(&motor, "speed", Value::Int(12));
        let mut out = String::new();
        vm.describe(&motor, &mut out, &CancelToken::none()).unwrap();
        assert_eq!(out, "Motor(12)");
    }

    #[test]
    fn test_self_referential_describe_hits_depth_limit() {
        let (mut vm, _) = machine();
        vm.set_max_depth(8);
        let ty = vm.define_type("Node");
        let me = vm.intern("me");
        let name = vm.intern("__str__");
        vm.set_describe(ty, Routine::new(name, vec![Op::WriteAttr(me)]));
        let node = vm.new_instance(ty);
        vm.set_attr(&node, "me", node.clone());

        let mut out = String::new();
        let Err(Unwind::Raise(exc)) = vm.describe(&node, &mut out, &CancelToken::none()) else {
            panic!("expected raise");
        };
        assert_eq!(&*exc.kind, "RuntimeError");
        assert_eq!(exc.message, "maximum recursion depth exceeded");
        assert_eq!(exc.traceback.len(), 8);
        assert_eq!(vm.depth(), 0);
    }

    #[test]
    fn test_cell_get() {
        let (mut vm, _) = machine();
        let cell = vm.new_cell(Value::Int(4));
        assert_eq!(vm.cell_get(&cell), Some(Value::Int(4)));
        assert_eq!(vm.cell_get(&Value::Int(4)), None);
    }

    #[test]
    fn test_report_uncaught() {
        let (mut vm, _) = machine();
        vm.report_uncaught(&Exception::new("ValueError", "oops"));
        assert_eq!(vm.uncaught_reports(), &["ValueError: oops\n".to_string()]);
    }
}
