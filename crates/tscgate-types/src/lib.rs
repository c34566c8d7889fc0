//! Data types (partition + receipts) for tscgate.
//!
//! This crate is intentionally "dumb": pure DTOs with serde.

use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const CHECK_SCHEMA_V1: &str = "tscgate.check.v1";

/// One parsed compiler diagnostic.
///
/// `line` and `col` are 1-based; `0` means the compiler emitted no source
/// position for this diagnostic. `code` is the 4-digit portion of the
/// `TSxxxx` code, kept as a string to preserve leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub code: String,
    pub message: String,
}

/// The classifier's output: every non-excluded, non-blank input line lands in
/// exactly one of these buckets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Partition {
    /// Parsed diagnostics whose file matched an include pattern.
    pub tracked: Vec<Diagnostic>,
    /// Raw lines that survived exclude filtering but either failed to parse
    /// or matched no include pattern. Original text, never rewritten.
    pub untracked: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pass,
    Fail,
}

impl GateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GateStatus::Pass => "pass",
            GateStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateCounts {
    pub tracked: u32,
    pub untracked: u32,
    pub excluded: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// What the type-checker invocation looked like from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerMeta {
    pub project: String,
    /// True when the checker exited 0 (no diagnostics, classification skipped).
    pub clean_exit: bool,
    /// Non-blank diagnostic lines handed to the classifier.
    pub lines_seen: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReceipt {
    pub schema: String,
    pub tool: ToolMeta,
    pub checker: CheckerMeta,
    pub tracked: Vec<Diagnostic>,
    pub counts: GateCounts,
    pub status: GateStatus,
}
