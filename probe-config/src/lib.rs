//! Probe Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Probe crates.

use serde::{Deserialize, Serialize};

/// Configuration for introspection calls made against a paused VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Longest accepted dot-separated path segment, in bytes
    pub max_segment_length: usize,
    /// Time budget for user-level stringification, in milliseconds
    pub value_timeout_ms: u64,
    /// Emit floats through the numeric sink instead of stringifying them
    pub numeric_fast_path: bool,
    /// Default frame cap for stack traces
    pub max_frames: usize,
    /// Default page size for attribute listings
    pub max_attributes: usize,
}

/// Configuration for fixed-size output buffers of the embedding layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Capacity of the bounded type-name text field
    pub type_text_capacity: usize,
    /// Capacity of the bounded value text field
    pub value_text_capacity: usize,
    /// Nesting limit for user-level routines before RuntimeError is raised
    pub max_call_depth: usize,
}

/// Introspection phase enum for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Resolve,
    Trace,
    Attrs,
    Format,
    Vm,
    Api,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Trace => "trace",
            Phase::Attrs => "attrs",
            Phase::Format => "format",
            Phase::Vm => "vm",
            Phase::Api => "api",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("probe::{}", self.as_str())
    }

    /// All phases, in pipeline order
    pub fn all() -> [Phase; 6] {
        [
            Phase::Resolve,
            Phase::Trace,
            Phase::Attrs,
            Phase::Format,
            Phase::Vm,
            Phase::Api,
        ]
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            max_segment_length: 64,
            value_timeout_ms: 100,
            numeric_fast_path: true,
            max_frames: 32,
            max_attributes: 64,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            type_text_capacity: 64,
            value_text_capacity: 256,
            max_call_depth: 64,
        }
    }
}
