//! 调用帧链
//!
//! 帧存放在 `FrameArena` 中，以 `FrameId` 句柄互相引用；
//! `previous` 指向调用者，根帧没有调用者。

use std::sync::Arc;

use crate::scope::Scope;
use crate::value::Value;

/// 帧句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

impl FrameId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 一次函数调用的运行时状态
#[derive(Debug, Clone)]
pub struct Frame {
    pub scope: Arc<Scope>,
    /// 局部槽位，按高端编号：槽位 0 是最后一个元素
    pub slots: Vec<Value>,
    /// 代码块内的字节偏移（含头部）
    pub ip: usize,
    /// 调用者
    pub previous: Option<FrameId>,
}

impl Frame {
    pub fn new(scope: Arc<Scope>, slots: Vec<Value>, ip: usize, previous: Option<FrameId>) -> Self {
        Self {
            scope,
            slots,
            ip,
            previous,
        }
    }

    /// 读取局部槽位，编号从高端数起
    pub fn slot(&self, index: usize) -> Option<&Value> {
        let pos = self.slots.len().checked_sub(index.checked_add(1)?)?;
        self.slots.get(pos)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Value> {
        let pos = self.slots.len().checked_sub(index.checked_add(1)?)?;
        self.slots.get_mut(pos)
    }
}

/// 帧存储
#[derive(Debug, Clone, Default)]
pub struct FrameArena {
    frames: Vec<Frame>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        self.frames.push(frame);
        id
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.index())
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 调用者；根帧或悬空句柄返回 None
    pub fn caller_of(&self, id: FrameId) -> Option<FrameId> {
        let previous = self.get(id)?.previous?;
        self.get(previous).map(|_| previous)
    }

    /// 从 `start` 沿调用者方向遍历，遇到根帧或悬空句柄结束
    pub fn chain(&self, start: FrameId) -> Chain<'_> {
        Chain {
            arena: self,
            cursor: self.get(start).map(|_| start),
            remaining: self.frames.len(),
        }
    }
}

/// 帧链迭代器，步数不超过帧总数，环形链不会死循环
pub struct Chain<'a> {
    arena: &'a FrameArena,
    cursor: Option<FrameId>,
    remaining: usize,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (FrameId, &'a Frame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        let frame = self.arena.get(id)?;
        self.remaining -= 1;
        self.cursor = self.arena.caller_of(id);
        Some((id, frame))
    }
}
