use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use xslt_fixtures::{Harness, HarnessConfig, Report, Resolution, XrustEngine};

#[derive(Debug)]
enum CliError {
    /// Bad flags or an unusable configuration (exit status 2).
    Config(xslt_fixtures::Error),
    Harness(xslt_fixtures::Error),
    Io(PathBuf, std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(err) => write!(f, "configuration error: {err}"),
            CliError::Harness(err) => write!(f, "{err}"),
            CliError::Io(path, err) => write!(f, "I/O error on {}: {err}", path.display()),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "xslt-fixtures",
    about = "Run every XSLT stylesheet against its input/output fixtures",
    version
)]
struct Cli {
    #[command(flatten)]
    roots: RootArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform and compare every fixture (the default).
    Run,
    /// Print the fixture pairs and discovery failures of one stylesheet.
    Resolve { stylesheet: PathBuf },
}

#[derive(Args, Debug)]
struct RootArgs {
    /// YAML or JSON configuration file. Relative roots inside it are taken from its directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    stylesheets: Option<PathBuf>,

    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[arg(long, global = true)]
    scratch: Option<PathBuf>,

    /// Treat whitespace-only XML text as significant.
    #[arg(long, global = true)]
    keep_whitespace: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Also write the rendered report to this file.
    #[arg(long, global = true)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Markdown,
}

fn load_config(roots: &RootArgs) -> Result<HarnessConfig, CliError> {
    let mut cfg = match &roots.config {
        Some(path) => {
            let base = path.parent().unwrap_or(Path::new(""));
            HarnessConfig::from_file(path)
                .map_err(CliError::Config)?
                .rooted_at(base)
        }
        None => HarnessConfig::default(),
    };
    if let Some(dir) = &roots.stylesheets {
        cfg.stylesheet_root = dir.clone();
    }
    if let Some(dir) = &roots.fixtures {
        cfg.fixture_root = dir.clone();
    }
    if let Some(dir) = &roots.scratch {
        cfg.scratch_root = dir.clone();
    }
    if roots.keep_whitespace {
        cfg.ignore_whitespace = false;
    }
    cfg.validate().map_err(CliError::Config)?;
    tracing::debug!(
        stylesheets = %cfg.stylesheet_root.display(),
        fixtures = %cfg.fixture_root.display(),
        scratch = %cfg.scratch_root.display(),
        "configuration loaded"
    );
    Ok(cfg)
}

fn render_report(report: &Report, format: Format) -> Result<String, CliError> {
    Ok(match format {
        Format::Text => format!("{report}\n"),
        Format::Json => format!("{}\n", serde_json::to_string_pretty(report)?),
        Format::Markdown => report.to_markdown(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PairOut<'a> {
    input: &'a Path,
    expected: &'a Path,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOut<'a> {
    stylesheet: &'a Path,
    fixture_dir: Option<&'a Path>,
    cases: Vec<PairOut<'a>>,
    failures: Vec<String>,
}

fn render_resolution(
    stylesheet: &Path,
    resolution: &Resolution,
    format: Format,
) -> Result<String, CliError> {
    let out = ResolveOut {
        stylesheet,
        fixture_dir: resolution.fixture_dir.as_deref(),
        cases: resolution
            .cases
            .iter()
            .map(|c| PairOut {
                input: &c.input,
                expected: &c.expected,
            })
            .collect(),
        failures: resolution.failures.iter().map(|f| f.to_string()).collect(),
    };
    if format == Format::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(&out)?));
    }

    let mut text = String::new();
    match out.fixture_dir {
        None => {
            let _ = writeln!(&mut text, "{}: no fixture directory", stylesheet.display());
        }
        Some(dir) => {
            let _ = writeln!(&mut text, "{} -> {}", stylesheet.display(), dir.display());
        }
    }
    for c in &out.cases {
        let _ = writeln!(
            &mut text,
            "  {} -> {}",
            c.input.display(),
            c.expected.display()
        );
    }
    for f in &out.failures {
        let _ = writeln!(&mut text, "  ! {f}");
    }
    Ok(text)
}

fn emit(text: &str, report_path: Option<&Path>) -> Result<(), CliError> {
    print!("{text}");
    if let Some(path) = report_path {
        std::fs::write(path, text).map_err(|err| CliError::Io(path.to_path_buf(), err))?;
    }
    Ok(())
}

/// Returns whether every fixture passed.
fn run(cli: Cli) -> Result<bool, CliError> {
    let cfg = load_config(&cli.roots)?;
    let harness = Harness::new(cfg, XrustEngine);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let report = harness.run_all().map_err(CliError::Harness)?;
            emit(
                &render_report(&report, cli.output.format)?,
                cli.output.report.as_deref(),
            )?;
            Ok(report.is_success())
        }
        Command::Resolve { stylesheet } => {
            let resolution = harness.resolve(&stylesheet).map_err(CliError::Harness)?;
            emit(
                &render_resolution(&stylesheet, &resolution, cli.output.format)?,
                cli.output.report.as_deref(),
            )?;
            Ok(resolution.failures.is_empty())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err @ CliError::Config(_)) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
