//! 驻留字符串表 (interned names)
//!
//! 解释器里所有标识符、属性名、文件名都驻留在这里，按 `Atom` 句柄引用。
//! `Atom(0)` 保留为空名，不对应任何真实标识符。

use std::collections::HashMap;
use std::sync::Arc;

/// 驻留字符串句柄
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// 保留的空名
    pub const EMPTY: Atom = Atom(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 全局驻留字符串表
#[derive(Debug, Clone)]
pub struct AtomTable {
    names: Vec<Arc<str>>,
    index: HashMap<Arc<str>, Atom>,
}

impl AtomTable {
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut index = HashMap::new();
        index.insert(Arc::clone(&empty), Atom::EMPTY);
        Self {
            names: vec![empty],
            index,
        }
    }

    /// 驻留字符串（已存在则复用）
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(&atom) = self.index.get(name) {
            return atom;
        }
        let atom = Atom(self.names.len() as u32);
        let text: Arc<str> = Arc::from(name);
        self.names.push(Arc::clone(&text));
        self.index.insert(text, atom);
        atom
    }

    /// 查找已驻留的字符串，不会新增条目
    pub fn find(&self, name: &str) -> Option<Atom> {
        self.index.get(name).copied()
    }

    pub fn get(&self, atom: Atom) -> Option<&Arc<str>> {
        self.names.get(atom.index())
    }

    /// 按句柄取文本，非法句柄返回空串
    pub fn name(&self, atom: Atom) -> &str {
        self.get(atom).map(|s| &**s).unwrap_or("")
    }

    /// 条目总数（含保留空名）
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }

    /// 所有真实标识符（跳过保留空名），按驻留顺序
    pub fn ids(&self) -> impl Iterator<Item = Atom> + '_ {
        (1..self.names.len()).map(|i| Atom(i as u32))
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}
