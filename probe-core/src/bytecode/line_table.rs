//! 行号表
//!
//! 将字节码偏移映射到源码行号。差分编码：每个条目是
//! `(varint pc_delta, zigzag line_delta)`，从 `(pc 0, line 1)` 开始累加。

use super::varint::{encode_sint, encode_uint, Reader};
use super::CodeError;

/// 行号条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    /// 字节码偏移
    pub pc: u32,
    /// 源码行号
    pub line: u32,
}

/// 行号表（编译侧构建用）
#[derive(Debug, Clone, Default)]
pub struct LineTable {
    pub entries: Vec<LineEntry>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加条目，pc 需单调不减
    pub fn add(&mut self, pc: u32, line: u32) {
        self.entries.push(LineEntry { pc, line });
    }

    /// 查找指定 PC 对应的行号（无条目命中时为 1）
    pub fn lookup(&self, pc: u32) -> u32 {
        let idx = self.entries.partition_point(|e| e.pc <= pc);
        if idx > 0 {
            self.entries[idx - 1].line
        } else {
            1
        }
    }

    /// 差分编码
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut prev_pc = 0u32;
        let mut prev_line = 1u32;

        for entry in &self.entries {
            let pc_delta = entry.pc.saturating_sub(prev_pc);
            let line_delta = entry.line as i64 - prev_line as i64;
            encode_uint(&mut out, pc_delta as u64);
            encode_sint(&mut out, line_delta);
            prev_pc = prev_pc.saturating_add(pc_delta);
            prev_line = entry.line;
        }

        out
    }
}

/// 直接在编码后的字节上线性扫描，返回 `offset` 所在行
///
/// 取最后一个 `pc <= offset` 条目的行号；条目的 pc 单调不减，
/// 遇到第一个超过 offset 的条目即停止。
pub fn source_line(encoded: &[u8], offset: usize) -> Result<u32, CodeError> {
    let mut reader = Reader::new(encoded);
    let mut pc = 0usize;
    let mut line = 1i64;

    while !reader.is_at_end() {
        let pc_delta = reader.read_usize()?;
        let line_delta = reader.read_sint()?;
        let next_pc = pc.checked_add(pc_delta).ok_or(CodeError::VarintOverflow)?;
        if next_pc > offset {
            break;
        }
        pc = next_pc;
        line = line.saturating_add(line_delta);
    }

    u32::try_from(line.max(0)).map_err(|_| CodeError::VarintOverflow)
}
