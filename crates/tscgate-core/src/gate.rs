use tscgate_types::{
    CHECK_SCHEMA_V1, CheckerMeta, GateCounts, GateReceipt, GateStatus, ToolMeta,
};

use crate::classify::classify;
use crate::render::{UntrackedSummary, render_tracked_report, render_untracked_summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePlan {
    /// Display name of the project config the checker ran against.
    pub project: String,
    /// Whitelist: files under active migration, must be clean.
    pub include_patterns: Vec<String>,
    /// Blacklist: lines dropped from both buckets.
    pub exclude_patterns: Vec<String>,
    /// Render the untracked summary on a passing run.
    pub print_summary: bool,
}

/// Captured result of the single type-checker invocation. `ok` is the only
/// signal taken from the exit status; `text` is stdout and stderr
/// concatenated. A failed spawn arrives here as `ok: false` with the error
/// message as text, indistinguishable from diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerOutput {
    pub ok: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRun {
    pub receipt: GateReceipt,
    /// Rendered failure report; present iff the gate failed.
    pub tracked_report: Option<String>,
    /// Advisory summary; present only on a passing run with untracked lines.
    pub untracked_summary: Option<UntrackedSummary>,
    pub exit_code: i32,
}

/// Evaluate one checker run against the plan.
///
/// A clean checker exit short-circuits: no classification is performed.
/// Otherwise the output is partitioned; any tracked diagnostic fails the
/// gate (exit 2), untracked lines are advisory only.
pub fn run_gate(plan: &GatePlan, checker: &CheckerOutput) -> GateRun {
    if checker.ok {
        return GateRun {
            receipt: receipt(plan, true, 0, GateCounts::default(), vec![]),
            tracked_report: None,
            untracked_summary: None,
            exit_code: 0,
        };
    }

    let lines: Vec<&str> = checker.text.lines().collect();
    let lines_seen = lines.iter().filter(|l| !l.trim().is_empty()).count() as u32;

    let partition = classify(lines, &plan.exclude_patterns, &plan.include_patterns);

    let counts = GateCounts {
        tracked: partition.tracked.len() as u32,
        untracked: partition.untracked.len() as u32,
        excluded: lines_seen - partition.tracked.len() as u32 - partition.untracked.len() as u32,
    };

    if !partition.tracked.is_empty() {
        let report = render_tracked_report(&partition.tracked);
        return GateRun {
            receipt: receipt(plan, false, lines_seen, counts, partition.tracked),
            tracked_report: Some(report),
            untracked_summary: None,
            exit_code: 2,
        };
    }

    let untracked_summary = if plan.print_summary {
        render_untracked_summary(&partition.untracked)
    } else {
        None
    };

    GateRun {
        receipt: receipt(plan, false, lines_seen, counts, vec![]),
        tracked_report: None,
        untracked_summary,
        exit_code: 0,
    }
}

fn receipt(
    plan: &GatePlan,
    clean_exit: bool,
    lines_seen: u32,
    counts: GateCounts,
    tracked: Vec<tscgate_types::Diagnostic>,
) -> GateReceipt {
    let status = if counts.tracked > 0 {
        GateStatus::Fail
    } else {
        GateStatus::Pass
    };

    GateReceipt {
        schema: CHECK_SCHEMA_V1.to_string(),
        tool: ToolMeta {
            name: "tscgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        checker: CheckerMeta {
            project: plan.project.clone(),
            clean_exit,
            lines_seen,
        },
        tracked,
        counts,
        status,
    }
}
