//! 自省错误

/// 自省调用的失败原因
///
/// 前置条件不满足和“找不到”都是常态结果，不代表解释器出错。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    #[error("interpreter is not paused")]
    NotPaused,

    #[error("another introspection call is in flight")]
    Busy,

    #[error("no active scope or frame")]
    NoActiveScope,

    #[error("path segment of {len} bytes exceeds the limit of {max}")]
    SegmentTooLong { len: usize, max: usize },

    #[error("not found")]
    NotFound,
}

impl InspectError {
    /// 是否为调用时机不对（而非路径本身的问题）
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            InspectError::NotPaused | InspectError::Busy | InspectError::NoActiveScope
        )
    }
}
