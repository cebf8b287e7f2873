//! `quill` subcommands.
//!
//! Arguments are parsed by hand, flag by flag, and mapped onto a
//! [`ServiceConfig`]. Each command returns the process exit code.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quill_backend::{LanguageVersion, QuillBackend};
use quill_loader::ImageLoader;
use quill_refs::{DirectoryFetcher, MemoryFetcher, ReferenceFetcher};

use crate::{CompileOutcome, CompileService, ConfigError, ServiceConfig};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

const RUN_USAGE: &str =
    "quill run <file> [--refs=<dir>] [--ref=<Name>]... [--stable] [--timeout=<ms>] [--json]";
const CHECK_USAGE: &str = "quill check <file> [--refs=<dir>] [--ref=<Name>]... [--stable]";

/// Options shared by `run` and `check`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOptions {
    pub file: PathBuf,
    /// Directory holding `<Name>.qlib` reference images.
    pub refs_dir: Option<PathBuf>,
    pub json: bool,
    pub config: ServiceConfig,
}

/// Parse the arguments following the subcommand name.
///
/// `allow_run_flags` enables `--timeout` and `--json`, which only `run`
/// accepts.
pub fn parse_options(
    args: &[String],
    allow_run_flags: bool,
) -> Result<CommandOptions, ConfigError> {
    let mut file = None;
    let mut refs_dir = None;
    let mut json = false;
    let mut config = ServiceConfig::default();

    for arg in args {
        if let Some(dir) = arg.strip_prefix("--refs=") {
            refs_dir = Some(PathBuf::from(dir));
        } else if let Some(name) = arg.strip_prefix("--ref=") {
            config = config.try_with_reference(name)?;
        } else if arg == "--stable" {
            config = config.with_language_version(LanguageVersion::Stable);
        } else if let Some(ms) = arg.strip_prefix("--timeout=").filter(|_| allow_run_flags) {
            let millis = ms
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    value: ms.to_string(),
                })?;
            config = config.with_invoke_timeout(Duration::from_millis(millis));
        } else if arg == "--json" && allow_run_flags {
            json = true;
        } else if arg.starts_with('-') {
            return Err(ConfigError::UnknownOption(arg.clone()));
        } else if file.is_none() {
            file = Some(PathBuf::from(arg));
        } else {
            return Err(ConfigError::UnexpectedArgument(arg.clone()));
        }
    }

    Ok(CommandOptions {
        file: file.ok_or(ConfigError::MissingFile)?,
        refs_dir,
        json,
        config,
    })
}

/// Dispatch `args` (without the program name) and return the exit code.
pub async fn dispatch(args: &[String]) -> i32 {
    let Some(command) = args.first() else {
        print_usage();
        return EXIT_USAGE;
    };
    let rest = &args[1..];
    match command.as_str() {
        "run" => match parse_options(rest, true) {
            Ok(options) => run_file(&options).await,
            Err(err) => usage_error(RUN_USAGE, &err),
        },
        "check" => match parse_options(rest, false) {
            Ok(options) => check_file(&options).await,
            Err(err) => usage_error(CHECK_USAGE, &err),
        },
        "help" | "--help" | "-h" => {
            print_usage();
            EXIT_SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("quill {}", env!("CARGO_PKG_VERSION"));
            EXIT_SUCCESS
        }
        other => {
            eprintln!("error: unknown command `{other}`");
            eprintln!();
            print_usage();
            EXIT_USAGE
        }
    }
}

/// Compile and run a file, printing its output.
///
/// The transcript goes to stderr and the program output to stdout. With
/// `--json` a single [`RunSummary`](crate::RunSummary) object goes to
/// stdout instead.
pub async fn run_file(options: &CommandOptions) -> i32 {
    let Some(source) = read_source(options).await else {
        return EXIT_USAGE;
    };
    let service = build_service(options);
    service.warm_up().await;
    let report = service.compile_and_run(source).await;

    if options.json {
        let summary = report.summary();
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: failed to serialize run summary: {err}");
                return EXIT_FAILURE;
            }
        }
    } else {
        eprint!("{}", report.log);
        let summary = report.summary();
        if let Some(output) = summary.output {
            println!("{output}");
        } else if let Some(error) = summary.error {
            eprintln!("error: {error}");
        }
    }

    if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}

/// Compile and load a file without running it.
pub async fn check_file(options: &CommandOptions) -> i32 {
    let Some(source) = read_source(options).await else {
        return EXIT_USAGE;
    };
    let service = build_service(options);
    service.warm_up().await;
    let report = service.compile(source).await;
    print!("{}", report.log);
    match report.outcome {
        CompileOutcome::Loaded(_) => EXIT_SUCCESS,
        CompileOutcome::NotProduced => EXIT_FAILURE,
        CompileOutcome::LoadFailed(err) => {
            eprintln!("error: {err}");
            EXIT_FAILURE
        }
    }
}

fn build_service(options: &CommandOptions) -> CompileService<QuillBackend, ImageLoader> {
    let fetcher: Arc<dyn ReferenceFetcher> = match &options.refs_dir {
        Some(dir) => Arc::new(DirectoryFetcher::new(dir)),
        None => Arc::new(MemoryFetcher::new()),
    };
    CompileService::new(
        QuillBackend::new(),
        ImageLoader::new(),
        fetcher,
        options.config.clone(),
    )
}

async fn read_source(options: &CommandOptions) -> Option<String> {
    match tokio::fs::read_to_string(&options.file).await {
        Ok(source) => Some(source),
        Err(err) => {
            eprintln!("error: cannot read '{}': {err}", options.file.display());
            None
        }
    }
}

fn usage_error(usage: &str, err: &ConfigError) -> i32 {
    eprintln!("error: {err}");
    eprintln!("Usage: {usage}");
    EXIT_USAGE
}

fn print_usage() {
    println!("Quill playground compiler");
    println!();
    println!("Usage: quill <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file>      Compile and run Program.GetString()");
    println!("  check <file>    Compile and load without running");
    println!("  help            Show this message");
    println!("  version         Show version information");
    println!();
    println!("Options:");
    println!("  --refs=<dir>    Directory of <Name>.qlib reference images");
    println!("  --ref=<Name>    Reference to link against (repeatable)");
    println!("  --stable        Use the stable language version (no `loop`)");
    println!("  --timeout=<ms>  Invoke timeout (run only)");
    println!("  --json          Print a JSON run summary (run only)");
}
