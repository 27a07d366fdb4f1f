//! 代码块 (Code Blob)
//!
//! 每个函数的代码块以定长格式的头部开始，所有整数均为 LEB128 变长编码：
//!
//! ```text
//! varint n_pos_args
//! varint n_kwonly_args
//! varint n_cells
//! varint n_info                 信息段字节数
//! 信息段 (n_info 字节):
//!     varint name_index         函数名在名字池中的索引
//!     varint arg_name_index × (n_pos_args + n_kwonly_args)
//!     行号表                     直到信息段结束
//! cell 段 (n_cells 字节)          每个 cell 变量一个局部槽位字节
//! 字节码
//! ```
//!
//! 名字池第 0 项固定为源文件名。

pub mod line_table;
pub mod varint;

use std::ops::Range;

use crate::atom::Atom;

pub use line_table::{source_line, LineEntry, LineTable};
use varint::{encode_uint, Reader};

/// 代码块解码错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("truncated varint")]
    Truncated,
    #[error("varint too large")]
    VarintOverflow,
    #[error("info section runs past the end of the code blob")]
    InfoOutOfBounds,
    #[error("instruction pointer {ip} lies outside bytecode {start}..{end}")]
    IpOutOfRange { ip: usize, start: usize, end: usize },
    #[error("name index {0} outside the name pool")]
    BadNameIndex(usize),
}

/// 原始代码块：头部 + 字节码，以及名字池
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlob {
    pub bytes: Vec<u8>,
    pub names: Vec<Atom>,
}

impl CodeBlob {
    pub fn new(bytes: Vec<u8>, names: Vec<Atom>) -> Self {
        Self { bytes, names }
    }

    /// 名字池查找
    pub fn name(&self, index: usize) -> Result<Atom, CodeError> {
        self.names
            .get(index)
            .copied()
            .ok_or(CodeError::BadNameIndex(index))
    }

    /// 源文件名（名字池第 0 项）
    pub fn source_file(&self) -> Result<Atom, CodeError> {
        self.name(0)
    }

    /// 解码头部
    pub fn info(&self) -> Result<FunctionInfo, CodeError> {
        FunctionInfo::decode(&self.bytes)
    }

    /// 将字节码内偏移转换为指令指针
    pub fn ip_at(&self, bytecode_offset: usize) -> Result<usize, CodeError> {
        Ok(self.info()?.bytecode_start + bytecode_offset)
    }
}

/// 头部解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub n_pos_args: usize,
    pub n_kwonly_args: usize,
    pub n_cells: usize,
    /// 函数名在名字池中的索引
    pub name_index: usize,
    /// 参数名在名字池中的索引
    pub arg_names: Vec<usize>,
    /// 行号表在代码块中的范围
    pub line_table: Range<usize>,
    /// 字节码起始位置
    pub bytecode_start: usize,
}

impl FunctionInfo {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodeError> {
        let mut reader = Reader::new(bytes);
        let n_pos_args = reader.read_usize()?;
        let n_kwonly_args = reader.read_usize()?;
        let n_cells = reader.read_usize()?;
        let n_info = reader.read_usize()?;

        let info_start = reader.offset();
        let info_end = info_start
            .checked_add(n_info)
            .filter(|&end| end <= bytes.len())
            .ok_or(CodeError::InfoOutOfBounds)?;
        let bytecode_start = info_end
            .checked_add(n_cells)
            .filter(|&end| end <= bytes.len())
            .ok_or(CodeError::InfoOutOfBounds)?;

        let info = &bytes[info_start..info_end];
        let mut reader = Reader::new(info);
        let name_index = reader.read_usize()?;
        let n_args = n_pos_args
            .checked_add(n_kwonly_args)
            .ok_or(CodeError::VarintOverflow)?;
        let mut arg_names = Vec::with_capacity(n_args.min(info.len()));
        for _ in 0..n_args {
            arg_names.push(reader.read_usize()?);
        }
        let line_table = info_start + reader.offset()..info_end;

        Ok(Self {
            n_pos_args,
            n_kwonly_args,
            n_cells,
            name_index,
            arg_names,
            line_table,
            bytecode_start,
        })
    }
}

/// 代码块构建器（编译侧）
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    names: Vec<Atom>,
    n_pos_args: usize,
    n_kwonly_args: usize,
    cells: Vec<u8>,
    lines: LineTable,
    code_len: usize,
}

impl CodeBuilder {
    /// `file` 放入名字池第 0 项，`name` 为函数名
    pub fn new(file: Atom, name: Atom) -> Self {
        Self {
            names: vec![file, name],
            n_pos_args: 0,
            n_kwonly_args: 0,
            cells: Vec::new(),
            lines: LineTable::new(),
            code_len: 0,
        }
    }

    pub fn arg(mut self, name: Atom) -> Self {
        self.names.push(name);
        self.n_pos_args += 1;
        self
    }

    pub fn kwonly_arg(mut self, name: Atom) -> Self {
        self.names.push(name);
        self.n_kwonly_args += 1;
        self
    }

    pub fn cell(mut self, slot: u8) -> Self {
        self.cells.push(slot);
        self
    }

    /// 记录从字节码偏移 `pc` 开始的源码行
    pub fn line(mut self, pc: u32, line: u32) -> Self {
        self.lines.add(pc, line);
        self
    }

    /// 字节码长度（内容填充为 0）
    pub fn code_len(mut self, len: usize) -> Self {
        self.code_len = len;
        self
    }

    pub fn build(self) -> CodeBlob {
        let mut info = Vec::new();
        encode_uint(&mut info, 1);
        for index in 2..self.names.len() {
            encode_uint(&mut info, index as u64);
        }
        info.extend_from_slice(&self.lines.encode());

        let mut bytes = Vec::new();
        encode_uint(&mut bytes, self.n_pos_args as u64);
        encode_uint(&mut bytes, self.n_kwonly_args as u64);
        encode_uint(&mut bytes, self.cells.len() as u64);
        encode_uint(&mut bytes, info.len() as u64);
        bytes.extend_from_slice(&info);
        bytes.extend_from_slice(&self.cells);
        bytes.resize(bytes.len() + self.code_len, 0);

        CodeBlob::new(bytes, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob() -> CodeBlob {
        CodeBuilder::new(Atom(1), Atom(2))
            .arg(Atom(3))
            .kwonly_arg(Atom(4))
            .cell(0)
            .line(0, 2)
            .line(6, 4)
            .code_len(10)
            .build()
    }

    #[test]
    fn test_decode_header() {
        let code = blob();
        let info = code.info().unwrap();
        assert_eq!(info.n_pos_args, 1);
        assert_eq!(info.n_kwonly_args, 1);
        assert_eq!(info.n_cells, 1);
        assert_eq!(info.name_index, 1);
        assert_eq!(info.arg_names, vec![2, 3]);
        assert_eq!(info.bytecode_start + 10, code.bytes.len());
        assert_eq!(code.name(info.name_index).unwrap(), Atom(2));
        assert_eq!(code.source_file().unwrap(), Atom(1));
    }

    #[test]
    fn test_line_table_range() {
        let code = blob();
        let info = code.info().unwrap();
        let table = &code.bytes[info.line_table.clone()];
        assert_eq!(source_line(table, 0).unwrap(), 2);
        assert_eq!(source_line(table, 5).unwrap(), 2);
        assert_eq!(source_line(table, 6).unwrap(), 4);
    }

    #[test]
    fn test_ip_at() {
        let code = blob();
        let start = code.info().unwrap().bytecode_start;
        assert_eq!(code.ip_at(3).unwrap(), start + 3);
    }

    #[test]
    fn test_info_past_end() {
        // n_info = 50 但代码块只有 5 字节
        let code = CodeBlob::new(vec![0, 0, 0, 50, 1], vec![Atom(1)]);
        assert_eq!(code.info(), Err(CodeError::InfoOutOfBounds));
    }

    #[test]
    fn test_truncated_header() {
        let code = CodeBlob::new(vec![0, 0x80], vec![]);
        assert_eq!(code.info(), Err(CodeError::Truncated));
    }

    #[test]
    fn test_bad_name_index() {
        let code = CodeBlob::new(vec![], vec![Atom(1)]);
        assert_eq!(code.name(4), Err(CodeError::BadNameIndex(4)));
    }
}
