//! 测试辅助工具

#![allow(dead_code)]

use probe_api::{Session, SessionConfig};

/// x: Local@0 = 42, y: GlobalImplicit（未赋值），m: Local@1 → Motor，
/// h: Local@2 → Hang（描述方法永不返回），b: Local@3 → Broken（描述方法抛异常）
pub const SNAPSHOT: &str = r#"{
    "file": "robot.py",
    "globals": { "ratio": { "float": 0.25 } },
    "types": [
        {
            "name": "Motor",
            "describe": [{ "write": "Motor(" }, { "write_attr": "rpm" }, { "write": ")" }]
        },
        {
            "name": "Hang",
            "describe": [{ "write": "partial" }, { "repeat": [{ "sleep": 10 }] }]
        },
        {
            "name": "Broken",
            "describe": [{ "raise": { "kind": "ValueError", "message": "no reading" } }]
        }
    ],
    "objects": [
        { "type": "Motor", "attrs": { "rpm": { "int": 1200 }, "port": { "str": "A" } } },
        { "type": "Hang" },
        { "type": "Broken" }
    ],
    "frames": [
        { "function": "<module>", "lines": [[0, 2], [4, 9]], "code_len": 8, "ip": 5 },
        {
            "function": "drive",
            "args": ["m"],
            "symbols": [
                { "name": "x", "kind": "local", "slot": 0 },
                { "name": "y", "kind": "global_implicit" },
                { "name": "m", "kind": "local", "slot": 1 },
                { "name": "h", "kind": "local", "slot": 2 },
                { "name": "b", "kind": "local", "slot": 3 },
                { "name": "ratio", "kind": "global_explicit" }
            ],
            "slots": [{ "object": 2 }, { "object": 1 }, { "object": 0 }, { "int": 42 }],
            "lines": [[0, 4], [6, 6]],
            "code_len": 12,
            "ip": 7
        }
    ]
}"#;

pub fn session() -> Session {
    Session::from_json(SNAPSHOT, SessionConfig::default()).unwrap()
}
