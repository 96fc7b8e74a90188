//! Thin CLI front end for `l0-drv`. Parses arguments, builds a
//! [`CompilationContext`], and calls [`l0_drv::compile`] — nothing here
//! pretty-prints a diagnostic beyond its plain [`Diagnostic::format_header`]
//! line, and nothing here spawns a C compiler; both are explicitly out of
//! this crate's scope.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use l0_drv::{CompilationContext, LogLevel, ModuleLoader, SourceSearchPaths};
use l0_util::{Handler, Interner};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compile a single `.l0` entry file to C99.
#[derive(ClapParser, Debug)]
#[command(name = "l0c", version, about)]
struct Cli {
    /// Entry module source file.
    entry: PathBuf,

    /// Additional directory to search for imported modules (repeatable).
    #[arg(long = "root", value_name = "DIR")]
    project_roots: Vec<PathBuf>,

    /// Additional system-level search directory, searched before project
    /// roots (repeatable).
    #[arg(long = "sys-root", value_name = "DIR")]
    system_roots: Vec<PathBuf>,

    /// Where to write the generated C99 source. Defaults to stdout.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Raise the log level one step per occurrence (warning -> info -> debug).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Guard ARC retain/release with `L0_TRACE_ARC`-conditioned stderr
    /// trace lines in the generated C.
    #[arg(long = "trace-arc")]
    trace_arc: bool,

    /// Guard allocator calls with `L0_TRACE_MEMORY`-conditioned stderr
    /// trace lines in the generated C.
    #[arg(long = "trace-memory")]
    trace_memory: bool,

    /// Omit the `#line` directive pointing back at the entry module.
    #[arg(long = "no-line-directives")]
    no_line_directives: bool,
}

fn log_level_for(cli: &Cli) -> LogLevel {
    if cli.quiet {
        return LogLevel::Silent;
    }
    match cli.verbose {
        0 => LogLevel::Warning,
        1 => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_level = log_level_for(&cli);

    let filter = EnvFilter::builder().with_default_directive(log_level.to_level_filter().into()).from_env_lossy();
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false).without_time()).init();

    let context = CompilationContext {
        emit_line_directives: !cli.no_line_directives,
        trace_arc: cli.trace_arc,
        trace_memory: cli.trace_memory,
        log_rich_format: false,
        log_level,
    };

    let mut interner = Interner::new();
    let mut search_paths = SourceSearchPaths::new();
    for root in &cli.system_roots {
        search_paths.add_system_root(root);
    }
    if let Some(parent) = cli.entry.parent() {
        search_paths.add_project_root(parent);
    }
    for root in &cli.project_roots {
        search_paths.add_project_root(root);
    }

    let mut handler = Handler::new();
    let unit = match ModuleLoader::new(search_paths, &mut interner).load_entry_file(&cli.entry, &mut handler) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("{}", e.to_diagnostic().format_header());
            return ExitCode::FAILURE;
        }
    };

    let output = l0_drv::compile(unit, &mut interner, &context);
    for diag in &output.diagnostics {
        eprintln!("{}", diag.format_header());
    }

    // compile() only returns a source string once every diagnostic it
    // collected is a warning (spec.md §7: "code generation runs only when
    // diagnostics contain zero error-kind entries") — a `None` here always
    // means at least one of the lines just printed was an error.
    let Some(source) = output.source else {
        return ExitCode::FAILURE;
    };

    let write_result = match &cli.output {
        Some(path) => std::fs::write(path, &source),
        None => std::io::stdout().write_all(source.as_bytes()),
    };
    if let Err(e) = write_result {
        eprintln!("error: failed to write output: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
