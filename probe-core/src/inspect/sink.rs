//! 输出回调
//!
//! 宿主提供一组回调接收格式化结果。每个回调只拿到借用的文本，
//! 文本在 `resume()` 之前一直有效。

/// 变量显示回调
pub trait LookupSink {
    fn type_name(&mut self, text: &str);
    fn value(&mut self, text: &str);
    /// 浮点快速通道
    fn float(&mut self, value: f64);
    fn separator(&mut self);
    fn terminator(&mut self);
    /// 描述超时，替代值之后的终止符
    fn timeout(&mut self);
}

/// 属性列举回调
pub trait AttributeSink {
    fn attribute(&mut self, name: &str);
    fn separator(&mut self);
    fn terminator(&mut self);
    /// 还有更多条目未输出
    fn overflow(&mut self);
}

/// 回调事件
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Type(String),
    Value(String),
    Float(f64),
    Attribute(String),
    Separator,
    Terminator,
    Timeout,
    Overflow,
}

/// 记录所有回调事件，便于嵌入方直接消费
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub events: Vec<SinkEvent>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// 列举到的属性名
    pub fn attributes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Attribute(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn overflowed(&self) -> bool {
        self.events.contains(&SinkEvent::Overflow)
    }

    pub fn timed_out(&self) -> bool {
        self.events.contains(&SinkEvent::Timeout)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl LookupSink for Transcript {
    fn type_name(&mut self, text: &str) {
        self.events.push(SinkEvent::Type(text.to_string()));
    }

    fn value(&mut self, text: &str) {
        self.events.push(SinkEvent::Value(text.to_string()));
    }

    fn float(&mut self, value: f64) {
        self.events.push(SinkEvent::Float(value));
    }

    fn separator(&mut self) {
        self.events.push(SinkEvent::Separator);
    }

    fn terminator(&mut self) {
        self.events.push(SinkEvent::Terminator);
    }

    fn timeout(&mut self) {
        self.events.push(SinkEvent::Timeout);
    }
}

impl AttributeSink for Transcript {
    fn attribute(&mut self, name: &str) {
        self.events.push(SinkEvent::Attribute(name.to_string()));
    }

    fn separator(&mut self) {
        self.events.push(SinkEvent::Separator);
    }

    fn terminator(&mut self) {
        self.events.push(SinkEvent::Terminator);
    }

    fn overflow(&mut self) {
        self.events.push(SinkEvent::Overflow);
    }
}

/// 定长文本缓冲区
///
/// 写满后截断，并把末尾三个字节替换为 `...`（容量不足 4 时只截断）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedText {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl BoundedText {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::new(),
            capacity,
            truncated: false,
        }
    }

    pub fn push(&mut self, s: &str) {
        if self.truncated {
            return;
        }
        let room = self.capacity - self.text.len();
        if s.len() <= room {
            self.text.push_str(s);
            return;
        }

        self.text.push_str(&s[..floor_char_boundary(s, room)]);
        self.truncated = true;
        if self.capacity > 3 {
            let keep = floor_char_boundary(&self.text, self.capacity - 3);
            self.text.truncate(keep);
            self.text.push_str("...");
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// 显示结果的三个定长字段：类型、值、作用域名
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSink {
    pub type_text: BoundedText,
    pub value_text: BoundedText,
    pub scope_text: BoundedText,
    pub float: Option<f64>,
    pub timed_out: bool,
    cursor: usize,
}

impl FieldSink {
    pub fn new(type_capacity: usize, value_capacity: usize) -> Self {
        Self {
            type_text: BoundedText::new(type_capacity),
            value_text: BoundedText::new(value_capacity),
            scope_text: BoundedText::new(type_capacity),
            float: None,
            timed_out: false,
            cursor: 0,
        }
    }

    fn field(&mut self) -> Option<&mut BoundedText> {
        match self.cursor {
            0 => Some(&mut self.type_text),
            1 => Some(&mut self.value_text),
            2 => Some(&mut self.scope_text),
            _ => None,
        }
    }
}

impl LookupSink for FieldSink {
    fn type_name(&mut self, text: &str) {
        if let Some(field) = self.field() {
            field.push(text);
        }
    }

    fn value(&mut self, text: &str) {
        if let Some(field) = self.field() {
            field.push(text);
        }
    }

    fn float(&mut self, value: f64) {
        self.float = Some(value);
        self.cursor = 2;
    }

    fn separator(&mut self) {}

    fn terminator(&mut self) {
        self.cursor += 1;
    }

    fn timeout(&mut self) {
        self.timed_out = true;
        self.cursor += 1;
    }
}
