//! 环形缓冲区输出
//!
//! 测试里挂在日志器上，用来断言自省过程写了什么。

use crate::logger::LogSink;
use crate::record::{Level, Record};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 定长记录缓冲，满了丢最旧的
pub struct LogRingBuffer {
    records: Mutex<VecDeque<Record>>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(LogRingBuffer {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicUsize::new(0),
        })
    }

    fn push(&self, record: Record) {
        if self.capacity == 0 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let Ok(mut records) = self.records.lock() else {
            return;
        };
        if records.len() == self.capacity {
            records.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        records.push_back(record);
    }

    /// 按写入顺序复制出全部记录
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .map(|records| records.iter().any(|r| r.message.contains(needle)))
            .unwrap_or(false)
    }

    /// 某操作期间写下的消息
    pub fn messages_in(&self, operation: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.operation == Some(operation))
            .map(|r| r.message)
            .collect()
    }

    /// 不低于给定级别的记录数
    pub fn count_at_least(&self, level: Level) -> usize {
        self.records
            .lock()
            .map(|records| records.iter().filter(|r| r.level >= level).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
        self.dropped.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for Arc<LogRingBuffer> {
    fn write(&self, record: &Record) {
        self.push(record.clone());
    }
}
