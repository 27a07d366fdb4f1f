//! Probe Core - paused-interpreter introspection (pure logic, no IO)
//!
//! Contains the scope/frame model, code-blob header decoding, a reference
//! interpreter, and the introspection layer that reads a paused VM:
//! variable path resolution, attribute listing, output formatting and
//! stack trace reconstruction.
//!
//! Loggers and limits are passed explicitly, not via global state.

pub mod atom;
pub mod bytecode;
pub mod cancel;
pub mod frame;
pub mod inspect;
pub mod interp;
pub mod report;
pub mod scope;
pub mod value;
pub mod vm;

// Re-export common types
pub use atom::{Atom, AtomTable};
pub use bytecode::{CodeBlob, CodeBuilder, CodeError};
pub use cancel::{CancelToken, Clock, ManualClock, SystemClock};
pub use frame::{Frame, FrameArena, FrameId};
pub use inspect::{
    AttributeSink, DisplayOptions, InspectError, LookupSink, Page, PausedVm, Rendered,
    StackTrace, TraceFrame,
};
pub use interp::{Interpreter, Unwind};
pub use report::{Exception, TracebackEntry};
pub use scope::{Scope, Symbol, SymbolKind};
pub use value::{ObjRef, Value};
pub use vm::Machine;

// Re-export config types from probe-config
pub use probe_config::{InspectConfig, LimitConfig, Phase};
