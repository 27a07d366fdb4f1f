//! 点分路径
//!
//! 段是调用方路径的借用切片，不复制到临时缓冲区；长度上限仍按调用方
//! 声明的值严格检查，不做截断。

use std::str::Split;

use super::error::InspectError;

/// 校验全部段后返回段迭代器
///
/// 任何一段超长都在查找开始前失败；空段（`a..b`、`.a`）视为找不到。
pub fn segments(path: &str, max_segment_length: usize) -> Result<Split<'_, char>, InspectError> {
    let mut has_empty = false;
    for segment in path.split('.') {
        if segment.len() > max_segment_length {
            return Err(InspectError::SegmentTooLong {
                len: segment.len(),
                max: max_segment_length,
            });
        }
        has_empty |= segment.is_empty();
    }
    if has_empty {
        return Err(InspectError::NotFound);
    }
    Ok(path.split('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        let parts: Vec<_> = segments("motor.config.speed", 16).unwrap().collect();
        assert_eq!(parts, vec!["motor", "config", "speed"]);
    }

    #[test]
    fn test_exact_bound_is_accepted() {
        assert!(segments("abcd.ef", 4).is_ok());
        assert_eq!(
            segments("abcde.ef", 4).unwrap_err(),
            InspectError::SegmentTooLong { len: 5, max: 4 }
        );
    }

    #[test]
    fn test_oversized_tail_rejected_up_front() {
        let err = segments("a.b.cccccccccc", 3).unwrap_err();
        assert!(matches!(err, InspectError::SegmentTooLong { len: 10, .. }));
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(segments("", 8).unwrap_err(), InspectError::NotFound);
        assert_eq!(segments("a..b", 8).unwrap_err(), InspectError::NotFound);
        assert_eq!(segments("a.", 8).unwrap_err(), InspectError::NotFound);
    }

    #[test]
    fn test_deep_path() {
        let path = vec!["x"; 10_000].join(".");
        assert_eq!(segments(&path, 1).unwrap().count(), 10_000);
    }
}
