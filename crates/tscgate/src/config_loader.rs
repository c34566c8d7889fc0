//! Configuration loading from the host project's manifest.
//!
//! The gate is configured from a `"tscgate"` object in the consumer's
//! `package.json`, plus two pattern-list files. List files come in three
//! flavors: a script module exporting an array (`.js`/`.cjs`/`.mjs`), a JSON
//! array, or newline-delimited text. Missing files are tolerated: the run
//! degrades to an empty list with a printed note.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_WHITELIST_PATH: &str = "ts-whitelist.js";
pub const DEFAULT_BLACKLIST_PATH: &str = "ts-blacklist.js";
pub const DEFAULT_TSCONFIG_PATH: &str = "tsconfig.json";

/// Effective configuration after manifest resolution and defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub whitelist_path: String,
    pub blacklist_path: String,
    pub tsconfig: String,
    pub print_files_list: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            whitelist_path: DEFAULT_WHITELIST_PATH.to_string(),
            blacklist_path: DEFAULT_BLACKLIST_PATH.to_string(),
            tsconfig: DEFAULT_TSCONFIG_PATH.to_string(),
            print_files_list: true,
        }
    }
}

/// The `"tscgate"` object inside package.json. Aliases keep the camelCase
/// keys the JS ecosystem tooling writes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestSection {
    #[serde(alias = "whiteList")]
    whitelist: Option<String>,
    #[serde(alias = "blackList")]
    blacklist: Option<String>,
    tsconfig: Option<String>,
    #[serde(alias = "printFilesList", alias = "print_files_list")]
    print_files_list: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    tscgate: Option<ManifestSection>,
}

/// Load the gate configuration from the manifest at `path`.
///
/// A missing or unparseable manifest is not fatal: the defaults apply and a
/// note is logged. Only the project config (tsconfig) is load-bearing, and
/// its absence is handled at invocation time.
pub fn load_config(path: &Path) -> GateConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            debug!("manifest {} not readable ({err}); using defaults", path.display());
            return GateConfig::default();
        }
    };

    let manifest: Manifest = match serde_json::from_str(&text) {
        Ok(manifest) => manifest,
        Err(err) => {
            warn!("manifest {} is not valid JSON ({err}); using defaults", path.display());
            return GateConfig::default();
        }
    };

    let section = manifest.tscgate.unwrap_or_default();
    let defaults = GateConfig::default();

    GateConfig {
        whitelist_path: section.whitelist.unwrap_or(defaults.whitelist_path),
        blacklist_path: section.blacklist.unwrap_or(defaults.blacklist_path),
        tsconfig: section.tsconfig.unwrap_or(defaults.tsconfig),
        print_files_list: section.print_files_list.unwrap_or(defaults.print_files_list),
    }
}

/// Read a pattern list from `path`.
///
/// Missing files yield an empty list plus a printed note; the run continues.
/// `.js`/`.cjs`/`.mjs` files are scanned for the string literals of their
/// exported array (they cannot be executed here); anything else is tried as
/// a JSON array first, then falls back to newline-delimited text.
pub fn read_list(path: &Path) -> Vec<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            println!("note: list file not found: {} (ignored)", path.display());
            return Vec::new();
        }
    };

    let is_script = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "js" | "cjs" | "mjs"));

    if is_script {
        return extract_module_strings(&text);
    }

    if let Ok(list) = serde_json::from_str::<Vec<String>>(&text) {
        return list;
    }

    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect the string literals inside the first array literal of a script
/// module, honoring quotes, escapes, and comments. Good enough for the
/// `module.exports = [...]` / `export default [...]` shapes these list files
/// actually take.
fn extract_module_strings(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = source.chars().peekable();
    let mut depth: usize = 0;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
            }
            '[' => depth += 1,
            ']' => {
                if depth <= 1 {
                    break;
                }
                depth -= 1;
            }
            '\'' | '"' | '`' => {
                let quote = c;
                let mut literal = String::new();
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                literal.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    other => other,
                                });
                            }
                        }
                        ch if ch == quote => break,
                        ch => literal.push(ch),
                    }
                }
                if depth >= 1 && !literal.trim().is_empty() {
                    out.push(literal);
                }
            }
            _ => {}
        }
    }

    out
}
