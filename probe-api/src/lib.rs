//! Probe API - host-facing introspection layer
//!
//! Provides the entry points a host uses against a paused interpreter:
//! - Variable resolution and display (`Session::resolve_variable`)
//! - Attribute listing (`Session::list_attributes`)
//! - Stack trace reconstruction (`Session::get_stack_trace`)
//! - Snapshot loading, session configuration, unified errors (ProbeError)
//!
//! For CLI convenience, this crate provides a global config singleton.
//! For library use, prefer passing a `SessionConfig` explicitly.

pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod types;

pub use config::{config as get_config, init as init_config, is_initialized, SessionConfig};
pub use error::{ErrorReport, InspectError, ProbeError};
pub use session::Session;
pub use snapshot::Snapshot;
pub use types::{FrameReport, TraceReport};

// Re-export config and core types
pub use probe_config;
pub use probe_config::{InspectConfig, LimitConfig, Phase};
pub use probe_core::inspect::sink::{
    AttributeSink, BoundedText, FieldSink, LookupSink, SinkEvent, Transcript,
};
pub use probe_core::{Rendered, StackTrace, TraceFrame, Value};

/// Load a snapshot file into a session using the global config
pub fn open(path: impl AsRef<std::path::Path>) -> Result<Session, ProbeError> {
    Session::load(path, get_config().clone())
}
