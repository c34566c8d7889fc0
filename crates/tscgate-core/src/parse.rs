use std::sync::LazyLock;

use regex::Regex;

use tscgate_types::Diagnostic;

/// Matches one compiler diagnostic line.
///
/// Example: `src/index.ts(1,1): error TS2304: Cannot find name 'x'.`
/// The parenthesized position is optional; global diagnostics omit it.
///
/// The file group is deliberately non-greedy and unanchored to any path
/// syntax, which mirrors what tsc actually prints. A path containing a
/// literal `: error TS` substring will misparse; that fragility is accepted
/// rather than risk drift from the compiler's real output format.
static DIAGNOSTIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(?:\((\d+),(\d+)\))?: error TS(\d{4}): (.*)$").expect("diagnostic grammar")
});

/// Parse a single raw line. Lines that do not match the grammar yield `None`;
/// callers that must account for every line keep the raw text themselves.
pub fn parse_line(line: &str) -> Option<Diagnostic> {
    let caps = DIAGNOSTIC_LINE.captures(line)?;

    let position = |idx: usize| -> u32 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    Some(Diagnostic {
        file: caps[1].to_string(),
        line: position(2),
        col: position(3),
        code: caps[4].to_string(),
        message: caps[5].to_string(),
    })
}

/// Parse raw checker output lines into structured diagnostics, omitting
/// anything that does not match the grammar.
pub fn parse<'a, I>(lines: I) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positioned_diagnostic() {
        let d = parse_line("src/index.ts(3,14): error TS2322: Type 'string' is not assignable.")
            .expect("should parse");
        assert_eq!(d.file, "src/index.ts");
        assert_eq!(d.line, 3);
        assert_eq!(d.col, 14);
        assert_eq!(d.code, "2322");
        assert_eq!(d.message, "Type 'string' is not assignable.");
    }

    #[test]
    fn position_defaults_to_zero_when_absent() {
        let d = parse_line("src/global.ts: error TS1208: 'x' cannot be compiled.")
            .expect("should parse");
        assert_eq!(d.file, "src/global.ts");
        assert_eq!((d.line, d.col), (0, 0));
        assert_eq!(d.code, "1208");
    }

    #[test]
    fn bare_global_diagnostic_does_not_parse() {
        // `tsc` prints project-level failures without a leading file path;
        // there is no `: error TS` separator, so the line stays raw.
        assert_eq!(parse_line("error TS5083: Cannot read file 'tsconfig.json'."), None);
    }

    #[test]
    fn rejects_non_diagnostic_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("Found 3 errors in 2 files."), None);
        assert_eq!(parse_line("a.ts(1,1): warning TS2304: not an error"), None);
        // code must be exactly 4 digits
        assert_eq!(parse_line("a.ts(1,1): error TS123: short code"), None);
    }

    #[test]
    fn rejects_five_digit_code() {
        // The code group is exactly 4 digits followed by `: `.
        assert_eq!(parse_line("a.ts(1,1): error TS12345: msg"), None);
    }

    #[test]
    fn keeps_empty_message() {
        let d = parse_line("a.ts(1,1): error TS2304: ").expect("should parse");
        assert_eq!(d.message, "");
    }

    #[test]
    fn parse_drops_unmatched_and_keeps_order() {
        let out = parse([
            "b.ts(2,1): error TS1005: ';' expected.",
            "noise",
            "a.ts(1,1): error TS2304: Cannot find name 'x'.",
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].file, "b.ts");
        assert_eq!(out[1].file, "a.ts");
    }
}
