//! 对象堆：类型、实例和 cell

use std::collections::HashMap;

use super::routine::Routine;
use crate::atom::{Atom, AtomTable};
use crate::value::{ObjRef, Value};

/// 类型句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// 类型信息
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: Atom,
    /// 类属性
    pub attrs: HashMap<Atom, Value>,
    /// 计算属性，读取时运行
    pub properties: HashMap<Atom, Routine>,
    /// 描述方法；没有则按 `<T object>` 显示
    pub describe: Option<Routine>,
}

impl TypeInfo {
    pub fn new(name: Atom) -> Self {
        Self {
            name,
            attrs: HashMap::new(),
            properties: HashMap::new(),
            describe: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum HeapObject {
    Instance {
        ty: TypeId,
        attrs: HashMap<Atom, Value>,
    },
    Cell(Value),
}

/// 内建类型
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub object: TypeId,
    pub none: TypeId,
    pub bool: TypeId,
    pub int: TypeId,
    pub float: TypeId,
    pub str: TypeId,
    pub function: TypeId,
    pub cell: TypeId,
}

const INT_METHODS: &[&str] = &["bit_length", "to_bytes", "from_bytes"];
const FLOAT_METHODS: &[&str] = &["is_integer", "hex"];
const STR_METHODS: &[&str] = &[
    "upper",
    "lower",
    "split",
    "join",
    "strip",
    "startswith",
    "endswith",
    "find",
    "replace",
    "format",
];

#[derive(Debug, Clone)]
pub struct Heap {
    types: Vec<TypeInfo>,
    objects: Vec<HeapObject>,
    builtins: Builtins,
}

impl Heap {
    pub fn new(atoms: &mut AtomTable) -> Self {
        let mut types = Vec::new();
        let mut define = |name: &str, methods: &[&str]| {
            let mut info = TypeInfo::new(atoms.intern(name));
            for method in methods {
                let atom = atoms.intern(method);
                info.attrs.insert(atom, Value::Native(atom));
            }
            types.push(info);
            TypeId(types.len() as u32 - 1)
        };

        let builtins = Builtins {
            object: define("object", &[]),
            none: define("NoneType", &[]),
            bool: define("bool", INT_METHODS),
            int: define("int", INT_METHODS),
            float: define("float", FLOAT_METHODS),
            str: define("str", STR_METHODS),
            function: define("function", &[]),
            cell: define("cell", &[]),
        };

        Self {
            types,
            objects: Vec::new(),
            builtins,
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn define_type(&mut self, name: Atom) -> TypeId {
        self.types.push(TypeInfo::new(name));
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn type_info(&self, ty: TypeId) -> Option<&TypeInfo> {
        self.types.get(ty.0 as usize)
    }

    pub fn type_info_mut(&mut self, ty: TypeId) -> Option<&mut TypeInfo> {
        self.types.get_mut(ty.0 as usize)
    }

    pub fn alloc(&mut self, object: HeapObject) -> ObjRef {
        self.objects.push(object);
        ObjRef(self.objects.len() as u32 - 1)
    }

    pub fn get(&self, obj: ObjRef) -> Option<&HeapObject> {
        self.objects.get(obj.index())
    }

    pub fn get_mut(&mut self, obj: ObjRef) -> Option<&mut HeapObject> {
        self.objects.get_mut(obj.index())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 值的类型；未绑定值没有类型
    pub fn type_of(&self, value: &Value) -> Option<TypeId> {
        let b = &self.builtins;
        let ty = match value {
            Value::Undefined => return None,
            Value::None => b.none,
            Value::Bool(_) => b.bool,
            Value::Int(_) => b.int,
            Value::Float(_) => b.float,
            Value::Str(_) => b.str,
            Value::Native(_) => b.function,
            Value::Cell(_) => b.cell,
            Value::Object(obj) => match self.get(*obj) {
                Some(HeapObject::Instance { ty, .. }) => *ty,
                Some(HeapObject::Cell(_)) => b.cell,
                None => b.object,
            },
        };
        Some(ty)
    }

    /// 实例自身的属性
    pub fn instance_attr(&self, obj: ObjRef, name: Atom) -> Option<&Value> {
        match self.get(obj)? {
            HeapObject::Instance { attrs, .. } => attrs.get(&name),
            HeapObject::Cell(_) => None,
        }
    }

    pub fn cell_contents(&self, obj: ObjRef) -> Option<&Value> {
        match self.get(obj)? {
            HeapObject::Cell(value) => Some(value),
            HeapObject::Instance { .. } => None,
        }
    }
}
