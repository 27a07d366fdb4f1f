//! 变量路径解析
//!
//! 第一段在当前作用域的符号表里查找，按存储类别读取；后续各段依次做
//! 属性读取。属性读取可能运行用户代码，整条路径共用一个时限，失败或
//! 超时一律视为找不到。

use probe_log::{debug, trace};

use super::error::InspectError;
use super::path::segments;
use super::PausedVm;
use crate::frame::FrameId;
use crate::interp::{Interpreter, Unwind};
use crate::scope::{find_symbol, Scope, SymbolKind};
use crate::value::Value;

/// 解析路径；调用方负责持有访问守卫
pub(crate) fn resolve_path<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &mut I,
    path: &str,
    max_segment_length: usize,
) -> Result<Value, InspectError> {
    let scope = state.active_scope().ok_or(InspectError::NoActiveScope)?;
    let frame = state.current_frame().ok_or(InspectError::NoActiveScope)?;

    let mut parts = segments(path, max_segment_length)?;
    let first = parts.next().ok_or(InspectError::NotFound)?;
    let mut value = lookup_symbol(vm, scope, frame, first)?;
    let token = state.attribute_token(&*vm);

    for name in parts {
        if value.is_undefined() {
            trace!(state.logger(), "'{}': cannot chain off undefined", path);
            return Err(InspectError::NotFound);
        }
        // 未驻留的名字不可能是任何对象的属性
        let Some(atom) = vm.atoms().find(name) else {
            trace!(state.logger(), "'{}': '{}' is not an interned name", path, name);
            return Err(InspectError::NotFound);
        };
        value = vm.attribute_load(&value, atom, &token).map_err(|err| {
            match err {
                Unwind::Abort => {
                    debug!(state.logger(), "'{}': attribute '{}' timed out", path, name)
                }
                Unwind::Raise(_) => {
                    trace!(state.logger(), "'{}': attribute '{}' failed", path, name)
                }
            }
            InspectError::NotFound
        })?;
    }

    Ok(value)
}

fn lookup_symbol<I: Interpreter + ?Sized>(
    vm: &I,
    scope: &Scope,
    frame: FrameId,
    name: &str,
) -> Result<Value, InspectError> {
    let atom = vm.atoms().find(name).ok_or(InspectError::NotFound)?;
    let symbol = find_symbol(scope, atom).ok_or(InspectError::NotFound)?;

    match symbol.kind {
        SymbolKind::Local | SymbolKind::Free => read_slot(vm, frame, symbol.slot),
        SymbolKind::Cell => {
            let cell = read_slot(vm, frame, symbol.slot)?;
            vm.cell_get(&cell).ok_or(InspectError::NotFound)
        }
        SymbolKind::GlobalExplicit | SymbolKind::GlobalImplicit => {
            Ok(vm.global_load(atom).unwrap_or(Value::Undefined))
        }
    }
}

fn read_slot<I: Interpreter + ?Sized>(
    vm: &I,
    frame: FrameId,
    slot: usize,
) -> Result<Value, InspectError> {
    vm.frames()
        .get(frame)
        .and_then(|f| f.slot(slot))
        .cloned()
        .ok_or(InspectError::NotFound)
}
