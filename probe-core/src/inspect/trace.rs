//! 调用栈重建
//!
//! 从当前帧沿调用者方向遍历，每帧解码代码块头部得到函数名、文件名和行号。
//! 元数据损坏时停止遍历并标记截断，不会报错。

use std::sync::Arc;

use probe_log::{trace, warn};

use super::PausedVm;
use crate::atom::AtomTable;
use crate::bytecode::{source_line, CodeError};
use crate::frame::Frame;
use crate::interp::Interpreter;
use crate::report::reported_line;

/// 一帧的回溯信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub block_name: Arc<str>,
    pub file: Arc<str>,
    pub line: usize,
}

/// 调用栈，最近的调用在前
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    pub frames: Vec<TraceFrame>,
    /// 还有未输出的帧，或遇到了损坏的帧
    pub truncated: bool,
}

pub(crate) fn stack_trace<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &I,
    max_frames: usize,
) -> StackTrace {
    let arena = vm.frames();
    let mut frames = Vec::with_capacity(max_frames.min(arena.len()));
    let mut cursor = state.current_frame();
    // 环形链保护：步数不超过帧总数
    let mut budget = arena.len();

    while let Some(id) = cursor {
        if frames.len() == max_frames {
            break;
        }
        let Some(frame) = arena.get(id).filter(|_| budget > 0) else {
            warn!(state.logger(), "frame chain broken at {}, stopping walk", id.0);
            return StackTrace {
                frames,
                truncated: true,
            };
        };
        budget -= 1;

        match decode_frame(vm.atoms(), frame) {
            Ok(entry) => frames.push(entry),
            Err(err) => {
                warn!(state.logger(), "malformed frame {}: {}", id.0, err);
                return StackTrace {
                    frames,
                    truncated: true,
                };
            }
        }
        cursor = frame.previous;
    }

    trace!(state.logger(), "stack trace: {} frames", frames.len());
    StackTrace {
        frames,
        truncated: cursor.is_some(),
    }
}

fn decode_frame(atoms: &AtomTable, frame: &Frame) -> Result<TraceFrame, CodeError> {
    let code = &frame.scope.code;
    let info = code.info()?;

    let end = code.bytes.len();
    if frame.ip < info.bytecode_start || frame.ip > end {
        return Err(CodeError::IpOutOfRange {
            ip: frame.ip,
            start: info.bytecode_start,
            end,
        });
    }
    let offset = frame.ip - info.bytecode_start;
    let line = source_line(&code.bytes[info.line_table.clone()], offset)?;

    let name = |index: usize| -> Result<Arc<str>, CodeError> {
        let atom = code.name(index)?;
        atoms
            .get(atom)
            .cloned()
            .ok_or(CodeError::BadNameIndex(index))
    };

    Ok(TraceFrame {
        block_name: name(info.name_index)?,
        file: name(0)?,
        line: reported_line(line),
    })
}
