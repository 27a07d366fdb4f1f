//! 测试辅助工具
//!
//! 构造一个暂停在两层调用中的参考解释器

#![allow(dead_code)]

use std::sync::Arc;

use probe_core::vm::{Op, Routine, TypeId};
use probe_core::{
    Atom, CodeBuilder, Frame, FrameId, Interpreter, Machine, ManualClock, PausedVm, Scope,
    Symbol, SymbolKind, Value,
};
use probe_log::Logger;

/// 暂停中的解释器及其上下文
pub struct Fixture {
    pub vm: Machine,
    pub state: PausedVm,
    pub clock: ManualClock,
    pub outer: FrameId,
    pub inner: FrameId,
    pub motor_type: TypeId,
}

/// 作用域符号
pub fn symbols(vm: &mut Machine, spec: &[(&str, SymbolKind, usize)]) -> Vec<Symbol> {
    spec.iter()
        .map(|(name, kind, slot)| Symbol::new(vm.intern(name), *kind, *slot))
        .collect()
}

/// 构造作用域；`lines` 为 (字节码偏移, 记录行号)
pub fn scope(
    vm: &mut Machine,
    name: &str,
    symbols: Vec<Symbol>,
    lines: &[(u32, u32)],
    code_len: usize,
) -> Arc<Scope> {
    let file = vm.intern("main.py");
    let atom = vm.intern(name);
    let mut builder = CodeBuilder::new(file, atom).code_len(code_len);
    for &(pc, line) in lines {
        builder = builder.line(pc, line);
    }
    Arc::new(Scope::new(atom, symbols, Arc::new(builder.build())))
}

/// 字节码偏移转换为指令指针
pub fn ip(scope: &Scope, offset: usize) -> usize {
    scope.code.ip_at(offset).unwrap()
}

/// 外层 `<module>` 调用内层 `step`，暂停在 `step` 中
///
/// `step` 的符号：x: Local@0 = 42, y: GlobalImplicit（未赋值），
/// motor: Local@1, speed: GlobalExplicit = 3.5, c: Cell@2 → 7, pending: Local@3 未绑定
pub fn paused() -> Fixture {
    let clock = ManualClock::new(1_000);
    let mut vm = Machine::with_clock(Arc::new(clock.clone()), Logger::noop());
    vm.set_source_file("main.py");

    let motor_type = vm.define_type("Motor");
    let describe = vm.intern("__str__");
    let rpm = vm.intern("rpm");
    vm.set_describe(
        motor_type,
        Routine::new(describe, vec![Op::Write("Motor(".into()), Op::WriteAttr(rpm), Op::Write(")".into())]),
    );
    let motor = vm.new_instance(motor_type);
    vm.set_attr(&motor, "rpm", Value::Int(1200));
    vm.set_attr(&motor, "label", Value::str("left"));
    vm.set_global("speed", Value::Float(3.5));

    let module_symbols = symbols(&mut vm, &[("step", SymbolKind::GlobalImplicit, 0)]);
    let module = scope(&mut vm, "<module>", module_symbols, &[(0, 2), (4, 11)], 8);
    let outer_ip = ip(&module, 5);
    let outer = vm.push_frame(Frame::new(module, vec![], outer_ip, None));

    let step_symbols = symbols(
        &mut vm,
        &[
            ("x", SymbolKind::Local, 0),
            ("y", SymbolKind::GlobalImplicit, 0),
            ("motor", SymbolKind::Local, 1),
            ("speed", SymbolKind::GlobalExplicit, 0),
            ("c", SymbolKind::Cell, 2),
            ("pending", SymbolKind::Local, 3),
        ],
    );
    let step = scope(&mut vm, "step", step_symbols, &[(0, 4), (6, 6)], 12);
    let cell = vm.new_cell(Value::Int(7));
    // 槽位从高端编号：slots[len-1] 是槽位 0
    let slots = vec![Value::Undefined, cell, motor, Value::Int(42)];
    let inner_ip = ip(&step, 7);
    let inner = vm.push_frame(Frame::new(step, slots, inner_ip, Some(outer)));

    let mut state = PausedVm::new(Logger::noop());
    assert!(state.pause_at(&vm, inner));

    Fixture {
        vm,
        state,
        clock,
        outer,
        inner,
        motor_type,
    }
}

/// 给 Motor 加一个永不返回的描述方法
pub fn hanging_describe(fixture: &mut Fixture) {
    let name = fixture.vm.intern("__str__");
    fixture.vm.set_describe(
        fixture.motor_type,
        Routine::new(name, vec![Op::Write("partial".into()), Op::Repeat(vec![Op::Sleep(10)])]),
    );
}

/// 给 Motor 加一个抛异常的描述方法
pub fn raising_describe(fixture: &mut Fixture) {
    let name = fixture.vm.intern("__str__");
    fixture.vm.set_describe(
        fixture.motor_type,
        Routine::new(
            name,
            vec![
                Op::Write("half".into()),
                Op::Raise {
                    kind: "ValueError".into(),
                    message: "bad state".into(),
                },
            ],
        )
        .at_line(9),
    );
}

/// 驻留名字（测试断言用）
pub fn atom(vm: &Machine, name: &str) -> Atom {
    vm.atoms().find(name).unwrap()
}
