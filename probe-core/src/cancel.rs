//! 时钟与取消令牌
//!
//! 用户代码（属性计算、描述方法）可能不返回。调用方给它一个带截止时间的
//! `CancelToken`，解释器在唯一的检查点（延时原语）上判断是否该放弃。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 单调毫秒时钟
pub trait Clock: Send + Sync {
    fn ticks_ms(&self) -> u64;
    fn sleep_ms(&self, ms: u64);
}

/// 系统时钟
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn ticks_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// 手动推进的时钟，`sleep_ms` 只推进计数，不真正等待
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn ticks_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

/// 取消令牌：可选截止时间 + 外部中止标志
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    deadline: Option<u64>,
    abort: Option<Arc<AtomicBool>>,
}

/// 延时检查点的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// 完整睡眠后继续执行
    Continue,
    /// 先睡眠剩余时间，再中止
    SleepThenAbort(u64),
    /// 立即中止
    Abort,
}

impl CancelToken {
    /// 不会取消的令牌
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_abort(flag: Arc<AtomicBool>) -> Self {
        Self {
            deadline: None,
            abort: Some(flag),
        }
    }

    pub fn with_deadline(mut self, deadline_ms: u64) -> Self {
        self.deadline = Some(deadline_ms);
        self
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// 在 `now_ms` 时刻请求睡眠 `delay_ms`
    pub fn checkpoint(&self, now_ms: u64, delay_ms: u64) -> Checkpoint {
        if self.is_aborted() {
            return Checkpoint::Abort;
        }
        match self.deadline {
            None => Checkpoint::Continue,
            Some(deadline) if now_ms >= deadline => Checkpoint::Abort,
            Some(deadline) => {
                let remaining = deadline - now_ms;
                if remaining < delay_ms {
                    Checkpoint::SleepThenAbort(remaining)
                } else {
                    Checkpoint::Continue
                }
            }
        }
    }
}
