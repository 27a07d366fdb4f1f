//! 暂停态快照
//!
//! 用 JSON 描述一个暂停中的解释器：全局变量、类型、对象和调用帧，
//! 加载后得到参考解释器和对应的暂停上下文。
//!
//! ```json
//! {
//!   "file": "main.py",
//!   "globals": { "limit": { "int": 10 } },
//!   "types": [{ "name": "Motor", "describe": [{ "write": "Motor" }] }],
//!   "objects": [{ "type": "Motor", "attrs": { "rpm": { "int": 1200 } } }],
//!   "frames": [
//!     { "function": "<module>", "lines": [[0, 2]], "code_len": 4, "ip": 1 },
//!     {
//!       "function": "step",
//!       "symbols": [{ "name": "m", "kind": "local", "slot": 0 }],
//!       "slots": [{ "object": 0 }],
//!       "lines": [[0, 4], [6, 6]],
//!       "code_len": 12,
//!       "ip": 7
//!     }
//!   ]
//! }
//! ```
//!
//! 帧按由外到内排列，最后一帧是暂停点。`lines` 是编译器记录的
//! `(字节码偏移, 行号)`，`ip` 是字节码内偏移。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use probe_core::vm::{Op, Routine, TypeId};
use probe_core::{
    CodeBuilder, Frame, FrameId, Machine, ObjRef, Scope, Symbol, SymbolKind, Value,
};
use probe_log::{debug, Logger};

use crate::error::ProbeError;

/// 快照值，外部标签形式：`{"int": 42}`、`"undefined"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpec {
    Undefined,
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Native(String),
    /// `objects` 中的下标
    Object(usize),
    Cell(Box<ValueSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpSpec {
    Write(String),
    WriteAttr(String),
    Sleep(u64),
    Spin(u64),
    Raise {
        kind: String,
        #[serde(default)]
        message: String,
    },
    Return(ValueSpec),
    Repeat(Vec<OpSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, ValueSpec>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<OpSpec>>,
    #[serde(default)]
    pub describe: Option<Vec<OpSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, ValueSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default)]
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSpec {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
    /// 槽位 0 在最后
    #[serde(default)]
    pub slots: Vec<ValueSpec>,
    #[serde(default)]
    pub lines: Vec<(u32, u32)>,
    #[serde(default)]
    pub code_len: usize,
    #[serde(default)]
    pub ip: usize,
}

fn default_paused() -> bool {
    true
}

fn default_file() -> String {
    "<stdin>".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_paused")]
    pub paused: bool,
    #[serde(default = "default_file")]
    pub file: String,
    #[serde(default)]
    pub globals: BTreeMap<String, ValueSpec>,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
}

/// 加载结果：解释器 + 暂停点
pub struct Loaded {
    pub machine: Machine,
    /// 暂停的帧（快照未暂停或没有帧时为 None）
    pub paused_at: Option<FrameId>,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self, ProbeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// 在给定解释器中重建快照
    pub fn build(&self, mut machine: Machine, logger: &Arc<Logger>) -> Result<Loaded, ProbeError> {
        machine.set_source_file(&self.file);
        let mut builder = Builder {
            machine,
            types: BTreeMap::new(),
            objects: Vec::with_capacity(self.objects.len()),
        };

        for ty in &self.types {
            let id = builder.machine.define_type(&ty.name);
            builder.types.insert(ty.name.clone(), id);
        }
        for object in &self.objects {
            let ty = builder.type_id(&object.type_name)?;
            let value = builder.machine.new_instance(ty);
            let Value::Object(obj) = value else {
                return Err(ProbeError::InvalidSnapshot("instance allocation failed".into()));
            };
            builder.objects.push(obj);
        }

        for ty in &self.types {
            let id = builder.type_id(&ty.name)?;
            for (name, value) in &ty.attrs {
                let value = builder.value(value)?;
                builder.machine.set_class_attr(id, name, value);
            }
            for (name, ops) in &ty.properties {
                let routine = builder.routine(name, ops)?;
                builder.machine.set_property(id, name, routine);
            }
            if let Some(ops) = &ty.describe {
                let routine = builder.routine("__str__", ops)?;
                builder.machine.set_describe(id, routine);
            }
        }
        for (index, object) in self.objects.iter().enumerate() {
            let target = Value::Object(builder.objects[index]);
            for (name, value) in &object.attrs {
                let value = builder.value(value)?;
                builder.machine.set_attr(&target, name, value);
            }
        }
        for (name, value) in &self.globals {
            let value = builder.value(value)?;
            builder.machine.set_global(name, value);
        }

        let mut previous = None;
        for frame in &self.frames {
            previous = Some(builder.frame(&self.file, frame, previous)?);
        }

        debug!(
            logger,
            "snapshot loaded: {} types, {} objects, {} frames",
            self.types.len(),
            self.objects.len(),
            self.frames.len()
        );

        Ok(Loaded {
            machine: builder.machine,
            paused_at: if self.paused { previous } else { None },
        })
    }
}

struct Builder {
    machine: Machine,
    types: BTreeMap<String, TypeId>,
    objects: Vec<ObjRef>,
}

impl Builder {
    fn type_id(&self, name: &str) -> Result<TypeId, ProbeError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| ProbeError::InvalidSnapshot(format!("unknown type '{}'", name)))
    }

    fn value(&mut self, spec: &ValueSpec) -> Result<Value, ProbeError> {
        Ok(match spec {
            ValueSpec::Undefined => Value::Undefined,
            ValueSpec::None => Value::None,
            ValueSpec::Bool(b) => Value::Bool(*b),
            ValueSpec::Int(n) => Value::Int(*n),
            ValueSpec::Float(x) => Value::Float(*x),
            ValueSpec::Str(s) => Value::str(s),
            ValueSpec::Native(name) => Value::Native(self.machine.intern(name)),
            ValueSpec::Object(index) => {
                let obj = self.objects.get(*index).copied().ok_or_else(|| {
                    ProbeError::InvalidSnapshot(format!("object {} out of range", index))
                })?;
                Value::Object(obj)
            }
            ValueSpec::Cell(inner) => {
                let inner = self.value(inner)?;
                self.machine.new_cell(inner)
            }
        })
    }

    fn routine(&mut self, name: &str, ops: &[OpSpec]) -> Result<Routine, ProbeError> {
        let atom = self.machine.intern(name);
        let ops = self.ops(ops)?;
        Ok(Routine::new(atom, ops))
    }

    fn ops(&mut self, specs: &[OpSpec]) -> Result<Vec<Op>, ProbeError> {
        let mut ops = Vec::with_capacity(specs.len());
        for spec in specs {
            let op = match spec {
                OpSpec::Write(text) => Op::Write(text.clone()),
                OpSpec::WriteAttr(name) => Op::WriteAttr(self.machine.intern(name)),
                OpSpec::Sleep(ms) => Op::Sleep(*ms),
                OpSpec::Spin(ms) => Op::Spin(*ms),
                OpSpec::Raise { kind, message } => Op::Raise {
                    kind: kind.clone(),
                    message: message.clone(),
                },
                OpSpec::Return(value) => Op::Return(self.value(value)?),
                OpSpec::Repeat(body) => Op::Repeat(self.ops(body)?),
            };
            ops.push(op);
        }
        Ok(ops)
    }

    fn frame(
        &mut self,
        file: &str,
        spec: &FrameSpec,
        previous: Option<FrameId>,
    ) -> Result<FrameId, ProbeError> {
        let file = self.machine.intern(file);
        let name = self.machine.intern(&spec.function);
        let mut code = CodeBuilder::new(file, name).code_len(spec.code_len);
        for arg in &spec.args {
            code = code.arg(self.machine.intern(arg));
        }
        for &(pc, line) in &spec.lines {
            code = code.line(pc, line);
        }
        let code = code.build();
        let ip = code
            .ip_at(spec.ip)
            .map_err(|e| ProbeError::InvalidSnapshot(format!("{}: {}", spec.function, e)))?;

        let symbols = spec
            .symbols
            .iter()
            .map(|s| Symbol::new(self.machine.intern(&s.name), s.kind, s.slot))
            .collect::<Vec<_>>();
        let slots = spec
            .slots
            .iter()
            .map(|v| self.value(v))
            .collect::<Result<Vec<_>, _>>()?;

        let scope = Arc::new(Scope::new(name, symbols, Arc::new(code)));
        Ok(self.machine.push_frame(Frame::new(scope, slots, ip, previous)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::Interpreter;

    const SAMPLE: &str = r#"{
        "file": "main.py",
        "globals": { "limit": { "int": 10 } },
        "types": [{
            "name": "Motor",
            "attrs": { "kind": { "str": "dc" } },
            "properties": { "load": [{ "return": { "float": 0.5 } }] },
            "describe": [{ "write": "Motor(" }, { "write_attr": "rpm" }, { "write": ")" }]
        }],
        "objects": [{ "type": "Motor", "attrs": { "rpm": { "int": 1200 } } }],
        "frames": [
            { "function": "<module>", "lines": [[0, 2]], "code_len": 4, "ip": 1 },
            {
                "function": "step",
                "args": ["m"],
                "symbols": [
                    { "name": "m", "kind": "local", "slot": 0 },
                    { "name": "limit", "kind": "global_implicit" },
                    { "name": "n", "kind": "cell", "slot": 1 }
                ],
                "slots": [{ "cell": { "int": 3 } }, { "object": 0 }],
                "lines": [[0, 4], [6, 6]],
                "code_len": 12,
                "ip": 7
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        assert!(snapshot.paused);
        assert_eq!(snapshot.frames.len(), 2);
        assert_eq!(snapshot.frames[1].symbols[1].kind, SymbolKind::GlobalImplicit);
        assert_eq!(snapshot.globals["limit"], ValueSpec::Int(10));
    }

    #[test]
    fn test_build_sample() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        let logger = Logger::noop();
        let loaded = snapshot.build(Machine::new(Arc::clone(&logger)), &logger).unwrap();
        let vm = loaded.machine;
        let top = loaded.paused_at.unwrap();
        let frame = vm.frames().get(top).unwrap();
        assert!(matches!(frame.slot(0), Some(Value::Object(_))));
        assert!(matches!(frame.slot(1), Some(Value::Cell(_))));
        assert_eq!(frame.previous, Some(FrameId(0)));
        let limit = vm.atoms().find("limit").unwrap();
        assert_eq!(vm.global_load(limit).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_unknown_type() {
        let snapshot = Snapshot::from_json(r#"{ "objects": [{ "type": "Ghost" }] }"#).unwrap();
        let logger = Logger::noop();
        let err = snapshot.build(Machine::new(Arc::clone(&logger)), &logger).err().unwrap();
        assert!(matches!(err, ProbeError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_object_out_of_range() {
        let snapshot = Snapshot::from_json(r#"{ "globals": { "g": { "object": 3 } } }"#).unwrap();
        let logger = Logger::noop();
        let err = snapshot.build(Machine::new(Arc::clone(&logger)), &logger).err().unwrap();
        assert!(err.to_string().contains("object 3 out of range"));
    }

    #[test]
    fn test_not_paused_snapshot() {
        let snapshot = Snapshot::from_json(
            r#"{ "paused": false, "frames": [{ "function": "f" }] }"#,
        )
        .unwrap();
        let logger = Logger::noop();
        let loaded = snapshot.build(Machine::new(Arc::clone(&logger)), &logger).unwrap();
        assert!(loaded.paused_at.is_none());
    }

    #[test]
    fn test_value_spec_forms() {
        let v: ValueSpec = serde_json::from_str(r#""undefined""#).unwrap();
        assert_eq!(v, ValueSpec::Undefined);
        let v: ValueSpec = serde_json::from_str(r#"{"cell": "none"}"#).unwrap();
        assert_eq!(v, ValueSpec::Cell(Box::new(ValueSpec::None)));
    }
}
