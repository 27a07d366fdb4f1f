//! 自省操作标签

use std::sync::Arc;

use crate::logger::Logger;

/// 操作守卫；drop 时弹出操作名
#[must_use]
pub struct OperationGuard {
    pub(crate) logger: Arc<Logger>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.logger.leave_operation();
    }
}
