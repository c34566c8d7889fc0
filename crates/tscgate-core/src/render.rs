use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use tscgate_types::Diagnostic;

/// Reduced grammar for the untracked summary: file + code, position and
/// message dropped.
static SIGNATURE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(?:\(\d+,\d+\))?: error TS(\d{4})").expect("signature grammar")
});

/// Render tracked diagnostics as the failure report.
///
/// Files are ordered lexicographically; within a file, diagnostics are
/// ordered by `(line, col)` with the original relative order preserved on
/// ties. Each file block is the path on its own line, one indented line per
/// diagnostic, and a blank separator line.
pub fn render_tracked_report(diagnostics: &[Diagnostic]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&Diagnostic>> = BTreeMap::new();
    for d in diagnostics {
        grouped.entry(d.file.as_str()).or_default().push(d);
    }

    let mut out: Vec<String> = Vec::new();
    for (file, mut group) in grouped {
        out.push(file.to_string());
        // sort_by_key is stable: equal (line, col) keep input order.
        group.sort_by_key(|d| (d.line, d.col));
        for d in group {
            out.push(format!(
                "  ({},{}): error TS{}: {}",
                d.line, d.col, d.code, d.message
            ));
        }
        out.push(String::new());
    }

    out.join("\n").trim_end().to_string()
}

/// The advisory summary of untracked lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntrackedSummary {
    /// Deduplicated `<file>: error TS<code>` signatures with group separators.
    pub body: String,
    /// Number of distinct signatures.
    pub entries: u32,
}

#[derive(Debug)]
struct Signature {
    file: String,
    key: String,
}

/// Separator state threaded through the rendering pass: a folder change gets
/// a double blank line, a file change within a folder a single one.
#[derive(Default)]
struct GroupingAcc {
    lines: Vec<String>,
    last_folder: String,
    last_file: String,
}

impl GroupingAcc {
    fn push(&mut self, sig: &Signature) {
        let folder = folder_of(&sig.file);
        if !self.last_folder.is_empty() && folder != self.last_folder {
            self.lines.push(String::new());
            self.lines.push(String::new());
        } else if !self.last_file.is_empty() && sig.file != self.last_file {
            self.lines.push(String::new());
        }
        self.lines.push(sig.key.clone());
        self.last_folder = folder;
        self.last_file = sig.file.clone();
    }
}

/// The file's path up to and including the last separator; empty for files
/// at the root.
fn folder_of(file: &str) -> String {
    match file.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/"),
        None => String::new(),
    }
}

/// Reduce untracked raw lines to a deduplicated, grouped summary.
///
/// Lines that do not match even the reduced grammar contribute nothing.
/// Returns `None` when no line yields a signature; the summary is advisory
/// and never affects the gate verdict.
pub fn render_untracked_summary(lines: &[String]) -> Option<UntrackedSummary> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut signatures: Vec<Signature> = Vec::new();

    for line in lines {
        let Some(caps) = SIGNATURE_LINE.captures(line) else {
            continue;
        };
        let file = caps[1].to_string();
        let key = format!("{}: error TS{}", file, &caps[2]);
        if seen.insert(key.clone()) {
            signatures.push(Signature { file, key });
        }
    }

    if signatures.is_empty() {
        return None;
    }

    // Stable sort: same-file entries stay in first-seen order.
    signatures.sort_by(|a, b| a.file.cmp(&b.file));

    let mut acc = GroupingAcc::default();
    for sig in &signatures {
        acc.push(sig);
    }

    Some(UntrackedSummary {
        body: acc.lines.join("\n"),
        entries: signatures.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(file: &str, line: u32, col: u32, code: &str, message: &str) -> Diagnostic {
        Diagnostic {
            file: file.to_string(),
            line,
            col,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn report_groups_and_sorts() {
        let diagnostics = vec![
            diag("b.ts", 2, 2, "1005", "';' expected."),
            diag("a.ts", 9, 1, "2304", "Cannot find name 'y'."),
            diag("a.ts", 1, 5, "2304", "Cannot find name 'x'."),
            diag("b.ts", 2, 1, "2322", "Type mismatch."),
        ];

        let report = render_tracked_report(&diagnostics);
        insta::assert_snapshot!(report, @r"
a.ts
  (1,5): error TS2304: Cannot find name 'x'.
  (9,1): error TS2304: Cannot find name 'y'.

b.ts
  (2,1): error TS2322: Type mismatch.
  (2,2): error TS1005: ';' expected.
");
    }

    #[test]
    fn report_has_no_trailing_whitespace() {
        let report = render_tracked_report(&[diag("a.ts", 1, 1, "2304", "m")]);
        assert_eq!(report, "a.ts\n  (1,1): error TS2304: m");
    }

    #[test]
    fn report_ties_keep_input_order() {
        let diagnostics = vec![
            diag("a.ts", 1, 1, "1111", "first"),
            diag("a.ts", 1, 1, "2222", "second"),
        ];
        let report = render_tracked_report(&diagnostics);
        let first = report.find("first").expect("first present");
        let second = report.find("second").expect("second present");
        assert!(first < second);
    }

    fn raw(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn summary_drops_position_and_message() {
        let lines = raw(&["src/a.ts(4,2): error TS2304: Cannot find name 'x'."]);
        let summary = render_untracked_summary(&lines).expect("summary");
        assert_eq!(summary.body, "src/a.ts: error TS2304");
        assert_eq!(summary.entries, 1);
    }

    #[test]
    fn summary_dedups_same_file_and_code() {
        let lines = raw(&[
            "src/a.ts(1,1): error TS2304: Cannot find name 'x'.",
            "src/a.ts(7,3): error TS2304: Cannot find name 'y'.",
        ]);
        let summary = render_untracked_summary(&lines).expect("summary");
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.body, "src/a.ts: error TS2304");
    }

    #[test]
    fn summary_keeps_distinct_codes() {
        let lines = raw(&[
            "src/a.ts(1,1): error TS2304: x",
            "src/a.ts(2,1): error TS2322: y",
        ]);
        let summary = render_untracked_summary(&lines).expect("summary");
        assert_eq!(summary.entries, 2);
        assert_eq!(
            summary.body,
            "src/a.ts: error TS2304\nsrc/a.ts: error TS2322"
        );
    }

    #[test]
    fn summary_separates_files_and_folders() {
        let lines = raw(&[
            "src/ui/button.ts(1,1): error TS2304: a",
            "src/ui/input.ts(1,1): error TS2304: b",
            "src/core/store.ts(1,1): error TS2322: c",
        ]);
        let summary = render_untracked_summary(&lines).expect("summary");
        insta::assert_snapshot!(summary.body, @r"
src/core/store.ts: error TS2322


src/ui/button.ts: error TS2304

src/ui/input.ts: error TS2304
");
        assert_eq!(summary.entries, 3);
    }

    #[test]
    fn summary_root_files_get_single_separators() {
        // Root-level files have no folder, so only file-change separators fire.
        let lines = raw(&[
            "a.ts(1,1): error TS2304: x",
            "b.ts(1,1): error TS2304: y",
        ]);
        let summary = render_untracked_summary(&lines).expect("summary");
        assert_eq!(summary.body, "a.ts: error TS2304\n\nb.ts: error TS2304");
    }

    #[test]
    fn summary_skips_lines_without_signature() {
        let lines = raw(&["Found 3 errors.", "noise"]);
        assert_eq!(render_untracked_summary(&lines), None);
    }

    #[test]
    fn summary_is_idempotent_over_its_own_output() {
        let lines = raw(&[
            "src/ui/button.ts(1,1): error TS2304: a",
            "src/core/store.ts(4,4): error TS2322: c",
            "src/ui/button.ts(9,9): error TS2304: dup",
        ]);
        let first = render_untracked_summary(&lines).expect("summary");
        let again_input: Vec<String> = first.body.lines().map(|l| l.to_string()).collect();
        let second = render_untracked_summary(&again_input).expect("summary");
        assert_eq!(second, first);
    }
}
