//! API 层配置
//!
//! 包含会话配置 SessionConfig 和全局单例（供 CLI 使用）

use once_cell::sync::OnceCell;
use probe_config::{InspectConfig, LimitConfig};
use probe_log::Logger;
use std::sync::Arc;

/// Session configuration
#[derive(Clone)]
pub struct SessionConfig {
    /// Introspection defaults
    pub inspect: InspectConfig,
    /// Output buffer limits
    pub limits: LimitConfig,
    /// Logger
    pub logger: Arc<Logger>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("inspect", &self.inspect)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inspect: InspectConfig::default(),
            limits: LimitConfig::default(),
            logger: Logger::noop(),
        }
    }
}

impl SessionConfig {
    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<SessionConfig> = OnceCell::new();

/// Initialize global configuration
///
/// Returns the rejected config if one is already installed.
pub fn init(config: SessionConfig) -> Result<(), SessionConfig> {
    GLOBAL_CONFIG.set(config)
}

/// Get global config reference, installing the default on first use
pub fn config() -> &'static SessionConfig {
    GLOBAL_CONFIG.get_or_init(SessionConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.inspect.max_segment_length, 64);
        assert_eq!(cfg.inspect.value_timeout_ms, 100);
        assert_eq!(cfg.limits.value_text_capacity, 256);
    }

    #[test]
    fn test_session_config_debug() {
        let cfg = SessionConfig::default();
        let debug_str = format!("{:?}", cfg);
        assert!(debug_str.contains("inspect"));
        assert!(debug_str.contains("limits"));
    }

    #[test]
    fn test_global_config() {
        // 全局状态：其他测试可能已初始化
        let cfg = config();
        assert!(is_initialized());
        assert!(cfg.inspect.max_frames > 0);
        assert!(init(SessionConfig::default()).is_err());
    }
}
