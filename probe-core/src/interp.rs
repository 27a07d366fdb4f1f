//! 解释器接口
//!
//! 自省层只通过这个 trait 与解释器交互。解释器本身（解析、编译、求值、GC）
//! 不在本 crate 的范围内，`vm::Machine` 是一个参考实现。

use crate::atom::{Atom, AtomTable};
use crate::cancel::CancelToken;
use crate::frame::FrameArena;
use crate::report::Exception;
use crate::value::Value;

/// 解释代码的非正常退出
#[derive(Debug, Clone, PartialEq)]
pub enum Unwind {
    /// 用户代码抛出异常
    Raise(Exception),
    /// 超时或外部中止
    Abort,
}

impl From<Exception> for Unwind {
    fn from(exception: Exception) -> Self {
        Unwind::Raise(exception)
    }
}

pub trait Interpreter {
    fn atoms(&self) -> &AtomTable;

    fn frames(&self) -> &FrameArena;

    /// 读取全局变量，不存在时返回异常
    fn global_load(&self, name: Atom) -> Result<Value, Exception>;

    /// 属性读取；可能运行用户代码（计算属性）
    fn attribute_load(&mut self, target: &Value, name: Atom, token: &CancelToken)
        -> Result<Value, Unwind>;

    /// 读取 cell 内容；`cell` 不是 cell 时返回 None
    fn cell_get(&self, cell: &Value) -> Option<Value>;

    fn type_name(&self, value: &Value) -> &str;

    /// 值的类型是否提供描述能力
    fn can_describe(&self, value: &Value) -> bool;

    /// 运行值的描述方法，输出写入 `out`
    fn describe(&mut self, value: &Value, out: &mut String, token: &CancelToken)
        -> Result<(), Unwind>;

    fn ticks_ms(&self) -> u64;

    /// 绑定到解释器中止标志的令牌
    fn cancel_token(&self) -> CancelToken {
        CancelToken::none()
    }

    /// 未捕获异常通道
    fn report_uncaught(&mut self, exception: &Exception);
}
