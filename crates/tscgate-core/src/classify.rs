use tscgate_types::Partition;

use crate::parse::parse_line;

/// Convert backslash separators to forward slashes so containment checks do
/// not depend on the platform the checker ran on. Applied to both sides of
/// every pattern match.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Partition raw checker output lines against two pattern sets.
///
/// Patterns are plain path fragments matched by case-sensitive substring
/// containment after separator normalization; no globs, no anchoring.
///
/// - Blank lines are dropped.
/// - A line whose whole text contains any exclude pattern is dropped. The
///   check runs on the full line rather than a parsed file field so that
///   lines the grammar cannot handle are still excludable.
/// - Surviving lines that parse and whose file contains an include pattern
///   become tracked diagnostics; everything else stays in `untracked` as the
///   original raw text.
pub fn classify<'a, I>(lines: I, exclude_patterns: &[String], include_patterns: &[String]) -> Partition
where
    I: IntoIterator<Item = &'a str>,
{
    let exclude: Vec<String> = exclude_patterns.iter().map(|p| normalize_separators(p)).collect();
    let include: Vec<String> = include_patterns.iter().map(|p| normalize_separators(p)).collect();

    let mut partition = Partition::default();

    for raw in lines {
        if raw.trim().is_empty() {
            continue;
        }

        let normalized = normalize_separators(raw);
        if exclude.iter().any(|p| normalized.contains(p.as_str())) {
            continue;
        }

        let tracked = parse_line(raw).filter(|d| {
            let file = normalize_separators(&d.file);
            include.iter().any(|p| file.contains(p.as_str()))
        });

        match tracked {
            Some(diagnostic) => partition.tracked.push(diagnostic),
            None => partition.untracked.push(raw.to_string()),
        }
    }

    partition
}
