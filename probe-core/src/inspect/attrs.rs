//! 属性列举
//!
//! 两种模式：空路径时列出当前作用域的符号名；否则对解析出的值逐个
//! 试探全部驻留名字，能读到的就是它的属性。试探要对每个名字做一次属性
//! 读取，开销与名字表大小成正比，不适合高频调用。

use std::ops::ControlFlow;

use probe_log::{debug, trace};

use super::sink::AttributeSink;
use super::PausedVm;
use crate::atom::Atom;
use crate::interp::{Interpreter, Unwind};
use crate::scope::{symbols_of, Scope};
use crate::value::Value;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub max_count: usize,
    pub skip: usize,
}

impl Page {
    pub fn new(max_count: usize, skip: usize) -> Self {
        Self { max_count, skip }
    }
}

/// 按页输出名字：先跳过 `skip` 个，最多输出 `max_count` 个，
/// 确有下一个时才发出溢出信号
struct Pager<'a> {
    sink: &'a mut dyn AttributeSink,
    page: Page,
    seen: usize,
    emitted: usize,
}

impl<'a> Pager<'a> {
    fn new(sink: &'a mut dyn AttributeSink, page: Page) -> Self {
        Self {
            sink,
            page,
            seen: 0,
            emitted: 0,
        }
    }

    fn offer(&mut self, name: &str) -> ControlFlow<()> {
        let index = self.seen;
        self.seen += 1;
        if index < self.page.skip {
            return ControlFlow::Continue(());
        }
        if self.emitted == self.page.max_count {
            self.sink.overflow();
            return ControlFlow::Break(());
        }
        if self.emitted > 0 {
            self.sink.separator();
        }
        self.sink.attribute(name);
        self.sink.terminator();
        self.emitted += 1;
        ControlFlow::Continue(())
    }
}

/// 列出作用域中的符号名
pub(crate) fn list_local<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &I,
    scope: &Scope,
    sink: &mut dyn AttributeSink,
    page: Page,
) -> usize {
    let atoms = vm.atoms();
    let mut pager = Pager::new(sink, page);
    for symbol in symbols_of(scope) {
        if pager.offer(atoms.name(symbol.name)).is_break() {
            break;
        }
    }
    trace!(state.logger(), "listed {} local names", pager.emitted);
    pager.emitted
}

/// 试探全部驻留名字，列出值上可读的属性
pub(crate) fn list_value<I: Interpreter + ?Sized>(
    state: &PausedVm,
    vm: &mut I,
    value: &Value,
    sink: &mut dyn AttributeSink,
    page: Page,
) -> usize {
    if value.is_undefined() {
        return 0;
    }

    let candidates: Vec<Atom> = vm.atoms().ids().collect();
    // 整次列举共用一个时限，超时后的计算属性直接跳过
    let token = state.attribute_token(&*vm);
    let mut pager = Pager::new(sink, page);
    let mut probed = 0usize;
    let mut timed_out = 0usize;

    for atom in candidates {
        probed += 1;
        match vm.attribute_load(value, atom, &token) {
            Ok(_) => {}
            Err(Unwind::Abort) => {
                timed_out += 1;
                continue;
            }
            Err(Unwind::Raise(_)) => continue,
        }
        let Some(name) = vm.atoms().get(atom).cloned() else {
            continue;
        };
        if pager.offer(&name).is_break() {
            break;
        }
    }

    if timed_out > 0 {
        debug!(state.logger(), "{} attribute reads timed out", timed_out);
    }
    trace!(
        state.logger(),
        "probed {} names, listed {} attributes",
        probed,
        pager.emitted
    );
    pager.emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::sink::{SinkEvent, Transcript};

    fn page_of(names: &[&str], page: Page) -> (usize, Transcript) {
        let mut transcript = Transcript::new();
        let mut pager = Pager::new(&mut transcript, page);
        for name in names {
            if pager.offer(name).is_break() {
                break;
            }
        }
        let emitted = pager.emitted;
        (emitted, transcript)
    }

    #[test]
    fn test_pager_separators() {
        let (count, t) = page_of(&["a", "b"], Page::new(10, 0));
        assert_eq!(count, 2);
        assert_eq!(
            t.events,
            vec![
                SinkEvent::Attribute("a".into()),
                SinkEvent::Terminator,
                SinkEvent::Separator,
                SinkEvent::Attribute("b".into()),
                SinkEvent::Terminator,
            ]
        );
    }

    #[test]
    fn test_pager_exact_fit_no_overflow() {
        let (count, t) = page_of(&["a", "b", "c"], Page::new(3, 0));
        assert_eq!(count, 3);
        assert!(!t.overflowed());
    }

    #[test]
    fn test_pager_overflow_when_more() {
        let (count, t) = page_of(&["a", "b", "c"], Page::new(2, 0));
        assert_eq!(count, 2);
        assert!(t.overflowed());
        assert_eq!(t.attributes(), vec!["a", "b"]);
    }

    #[test]
    fn test_pager_skip() {
        let (count, t) = page_of(&["a", "b", "c", "d"], Page::new(2, 1));
        assert_eq!(t.attributes(), vec!["b", "c"]);
        assert_eq!(count, 2);
        assert!(t.overflowed());
    }

    #[test]
    fn test_pager_skip_past_end() {
        let (count, t) = page_of(&["a", "b"], Page::new(5, 2));
        assert_eq!(count, 0);
        assert!(t.events.is_empty());
        let (count, t) = page_of(&["a", "b"], Page::new(5, 9));
        assert_eq!(count, 0);
        assert!(!t.overflowed());
    }

    #[test]
    fn test_pager_zero_max_count() {
        let (count, t) = page_of(&["a"], Page::new(0, 0));
        assert_eq!(count, 0);
        assert!(t.overflowed());
        let (_, t) = page_of(&[], Page::new(0, 0));
        assert!(!t.overflowed());
    }
}
