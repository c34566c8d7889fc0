use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use tscgate_core::{CheckerOutput, GatePlan, run_gate};

mod config_loader;

use config_loader::{load_config, read_list};

const DEFAULT_MANIFEST_PATH: &str = "package.json";
const DEFAULT_TSC_PATH: &str = "node_modules/typescript/bin/tsc";

#[derive(Parser)]
#[command(name = "tscgate")]
#[command(about = "Incremental TypeScript strictness gate", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the type checker and gate on whitelisted diagnostics.
    Check(CheckArgs),

    /// Print the effective whitelist/blacklist after config resolution.
    Patterns(PatternsArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the host project manifest carrying the "tscgate" section.
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// TypeScript project config passed to the checker (overrides manifest).
    #[arg(long)]
    project: Option<String>,

    /// Whitelist file: files under migration, must be clean (overrides manifest).
    #[arg(long)]
    whitelist: Option<PathBuf>,

    /// Blacklist file: diagnostics dropped entirely (overrides manifest).
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// Path to the tsc executable.
    #[arg(long, value_name = "PATH")]
    tsc: Option<PathBuf>,

    /// Read captured checker output from a file (or '-' for stdin) instead of
    /// invoking tsc. Empty input is treated as a clean run.
    ///
    /// Mutually exclusive with --project and --tsc.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["project", "tsc"])]
    input: Option<PathBuf>,

    /// Suppress the advisory summary of non-whitelisted diagnostics.
    #[arg(long)]
    no_summary: bool,

    /// Write the JSON receipt to this path.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PatternsArgs {
    /// Path to the host project manifest carrying the "tscgate" section.
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Whitelist file (overrides manifest).
    #[arg(long)]
    whitelist: Option<PathBuf>,

    /// Blacklist file (overrides manifest).
    #[arg(long)]
    blacklist: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PatternsFormat::Text)]
    format: PatternsFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PatternsFormat {
    Text,
    Json,
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Check(args) => cmd_check(args),
        Commands::Patterns(args) => {
            cmd_patterns(args)?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn cmd_check(args: CheckArgs) -> Result<i32> {
    let cfg = load_config(&args.manifest);

    let whitelist_path = args
        .whitelist
        .unwrap_or_else(|| PathBuf::from(&cfg.whitelist_path));
    let blacklist_path = args
        .blacklist
        .unwrap_or_else(|| PathBuf::from(&cfg.blacklist_path));

    info!(
        "configuration: whitelist={}, blacklist={}, tsconfig={}",
        whitelist_path.display(),
        blacklist_path.display(),
        cfg.tsconfig
    );

    let whitelist = read_list(&whitelist_path);
    let blacklist = read_list(&blacklist_path);

    info!(
        "loaded {} whitelist pattern(s), {} blacklist pattern(s)",
        whitelist.len(),
        blacklist.len()
    );

    let (project, checker) = match &args.input {
        Some(input) => {
            let text = read_input(input)
                .with_context(|| format!("read checker output from {}", input.display()))?;
            let ok = text.trim().is_empty();
            (input.display().to_string(), CheckerOutput { ok, text })
        }
        None => {
            let tsconfig = args.project.clone().unwrap_or_else(|| cfg.tsconfig.clone());
            if !Path::new(&tsconfig).exists() {
                bail!("TypeScript config file not found: {tsconfig}");
            }

            let tsc = args.tsc.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_TSC_PATH));
            info!("running type check with config: {tsconfig}");
            let checker = run_type_checker(&tsc, &tsconfig);
            (tsconfig, checker)
        }
    };

    let plan = GatePlan {
        project,
        include_patterns: whitelist,
        exclude_patterns: blacklist,
        print_summary: cfg.print_files_list && !args.no_summary,
    };

    let run = run_gate(&plan, &checker);

    if let Some(out) = &args.out {
        write_json(out, &run.receipt)?;
        info!("receipt written to {}", out.display());
    }

    if let Some(report) = &run.tracked_report {
        eprintln!(
            "{} type error(s) in whitelisted files:",
            run.receipt.counts.tracked
        );
        eprintln!("{report}");
    } else if checker.ok {
        println!("no type errors.");
    } else {
        println!("no type errors in whitelisted files.");
        if let Some(summary) = &run.untracked_summary {
            println!();
            println!("{}", summary.body);
            println!();
            println!(
                "found {} error signature(s) outside the whitelist (blacklisted files excluded)",
                summary.entries
            );
        }
    }

    Ok(run.exit_code)
}

fn cmd_patterns(args: PatternsArgs) -> Result<()> {
    let cfg = load_config(&args.manifest);

    let whitelist_path = args
        .whitelist
        .unwrap_or_else(|| PathBuf::from(&cfg.whitelist_path));
    let blacklist_path = args
        .blacklist
        .unwrap_or_else(|| PathBuf::from(&cfg.blacklist_path));

    let whitelist = read_list(&whitelist_path);
    let blacklist = read_list(&blacklist_path);

    match args.format {
        PatternsFormat::Text => {
            println!("whitelist ({}):", whitelist.len());
            for p in &whitelist {
                println!("  {p}");
            }
            println!("blacklist ({}):", blacklist.len());
            for p in &blacklist {
                println!("  {p}");
            }
        }
        PatternsFormat::Json => {
            let value = serde_json::json!({
                "whitelist": whitelist,
                "blacklist": blacklist,
            });
            let s = serde_json::to_string_pretty(&value).context("render json")?;
            println!("{s}");
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Invoke `tsc --noEmit --project <tsconfig>` once, synchronously.
///
/// Only the exit status distinguishes clean from dirty; stdout and stderr are
/// concatenated into one blob for classification. A failed spawn (missing
/// binary, permissions) is folded into the same shape: the error message
/// becomes checker text and classification routes it to the untracked bucket.
fn run_type_checker(tsc: &Path, tsconfig: &str) -> CheckerOutput {
    match Command::new(tsc)
        .args(["--noEmit", "--project", tsconfig])
        .output()
    {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            CheckerOutput {
                ok: output.status.success(),
                text,
            }
        }
        Err(err) => CheckerOutput {
            ok: false,
            text: format!("failed to run type checker at {}: {err}", tsc.display()),
        },
    }
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }

    let bytes = serde_json::to_vec_pretty(value).context("serialize receipt")?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
