//! 作用域元数据
//!
//! 编译器为每个函数生成一份符号表：名字、存储类别和槽位。
//! 作用域在运行期不可变，通过 `Arc` 在帧之间共享。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::bytecode::CodeBlob;

/// 符号存储类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// 局部变量，直接存放在帧槽位
    Local,
    /// 自由变量（闭包捕获），直接存放在帧槽位
    Free,
    /// cell 变量，帧槽位里是装箱的 cell
    Cell,
    /// 显式 `global` 声明
    GlobalExplicit,
    /// 未在本作用域赋值，隐式全局
    GlobalImplicit,
}

impl SymbolKind {
    /// 是否从全局命名空间解析
    pub fn is_global(self) -> bool {
        matches!(self, SymbolKind::GlobalExplicit | SymbolKind::GlobalImplicit)
    }
}

/// 符号描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub name: Atom,
    pub kind: SymbolKind,
    /// 局部槽位编号（全局符号无意义）
    pub slot: usize,
}

impl Symbol {
    pub fn new(name: Atom, kind: SymbolKind, slot: usize) -> Self {
        Self { name, kind, slot }
    }
}

/// 编译后的函数作用域
#[derive(Debug, Clone)]
pub struct Scope {
    pub simple_name: Atom,
    pub symbols: Vec<Symbol>,
    pub code: Arc<CodeBlob>,
}

impl Scope {
    pub fn new(simple_name: Atom, symbols: Vec<Symbol>, code: Arc<CodeBlob>) -> Self {
        Self {
            simple_name,
            symbols,
            code,
        }
    }
}

/// 按名字查找符号，线性扫描
pub fn find_symbol(scope: &Scope, name: Atom) -> Option<&Symbol> {
    scope.symbols.iter().find(|symbol| symbol.name == name)
}

/// 作用域中的全部符号，保持编译顺序
pub fn symbols_of(scope: &Scope) -> &[Symbol] {
    &scope.symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::CodeBuilder;

    fn scope(symbols: Vec<Symbol>) -> Scope {
        let code = CodeBuilder::new(Atom(1), Atom(2)).build();
        Scope::new(Atom(2), symbols, Arc::new(code))
    }

    #[test]
    fn test_find_symbol() {
        let s = scope(vec![
            Symbol::new(Atom(3), SymbolKind::Local, 0),
            Symbol::new(Atom(4), SymbolKind::GlobalImplicit, 0),
        ]);
        let found = find_symbol(&s, Atom(4)).unwrap();
        assert_eq!(found.kind, SymbolKind::GlobalImplicit);
        assert!(find_symbol(&s, Atom(9)).is_none());
    }

    #[test]
    fn test_empty_scope() {
        let s = scope(vec![]);
        assert!(symbols_of(&s).is_empty());
        assert!(find_symbol(&s, Atom(3)).is_none());
    }

    #[test]
    fn test_symbols_keep_order() {
        let s = scope(vec![
            Symbol::new(Atom(5), SymbolKind::Cell, 1),
            Symbol::new(Atom(3), SymbolKind::Local, 0),
        ]);
        let names: Vec<_> = symbols_of(&s).iter().map(|sym| sym.name).collect();
        assert_eq!(names, vec![Atom(5), Atom(3)]);
    }

    #[test]
    fn test_kind_is_global() {
        assert!(SymbolKind::GlobalExplicit.is_global());
        assert!(!SymbolKind::Free.is_global());
    }
}
