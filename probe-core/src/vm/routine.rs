//! 解释例程
//!
//! 计算属性和描述方法在这里是一段操作序列，用来模拟任意用户代码：
//! 输出文本、睡眠、抛异常、返回值、死循环。

use std::sync::Arc;

use crate::atom::Atom;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// 向描述输出写入文本
    Write(String),
    /// 读取 self 的属性并写入其描述
    WriteAttr(Atom),
    /// 调用延时原语（唯一的取消检查点）
    Sleep(u64),
    /// 忙等，不经过检查点
    Spin(u64),
    Raise { kind: String, message: String },
    Return(Value),
    /// 无限重复，直到内部返回或展开
    Repeat(Vec<Op>),
}

/// 一段解释例程
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: Atom,
    /// 行号表中记录的原始行号
    pub line: u32,
    pub ops: Arc<[Op]>,
}

impl Routine {
    pub fn new(name: Atom, ops: Vec<Op>) -> Self {
        Self {
            name,
            line: 1,
            ops: Arc::from(ops),
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}
