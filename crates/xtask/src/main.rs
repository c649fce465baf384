mod cmd;

#[derive(Debug, thiserror::Error)]
enum XtaskError {
    #[error("usage: xtask <command> ...")]
    Usage,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Harness(#[from] xslt_fixtures::Error),
    #[error("verification failed:\n{0}")]
    VerifyFailed(String),
    #[error("xml canonicalization failed: {0}")]
    CanonFailed(String),
    #[error("xml compare failed:\n{0}")]
    CompareFailed(String),
    #[error("fixture corpus check failed:\n{0}")]
    CorpusFailed(String),
}

fn print_help(topic: Option<&str>) {
    if let Some(topic) = topic.filter(|t| !t.trim().is_empty()) {
        println!("usage: xtask {topic} ...");
        println!();
        println!("This repository uses a lightweight custom CLI parser for xtask commands.");
        println!("Most subcommands accept `--help`/`-h` and will show a usage error.");
        println!();
        println!("See: `crates/xtask/src/main.rs` for the full argument grammar.");
        return;
    }

    println!("usage: xtask <command> ...");
    println!();
    println!("Commands:");
    println!("  verify                                     fmt + nextest (or cargo test) + check-corpus");
    println!("  check-corpus [--config <file>]             run the sample fixture corpus");
    println!("  canon-xml --in <file> [--keep-whitespace]  print the canonical comparison form");
    println!("  compare-xml --expected <file> --actual <file>");
    println!();
    println!("Topics:");
    println!("  xtask help <command>");
}

fn main() -> Result<(), XtaskError> {
    let mut args = std::env::args().skip(1);
    let Some(cmd_name) = args.next() else {
        return Err(XtaskError::Usage);
    };

    if matches!(cmd_name.as_str(), "--help" | "-h") {
        print_help(None);
        return Ok(());
    }
    if cmd_name == "help" {
        print_help(args.next().as_deref());
        return Ok(());
    }

    match cmd_name.as_str() {
        "verify" => cmd::verify(args.collect()),
        "check-corpus" => cmd::check_corpus(args.collect()),
        "canon-xml" => cmd::canon_xml(args.collect()),
        "compare-xml" => cmd::compare_xml(args.collect()),
        other => Err(XtaskError::UnknownCommand(other.to_string())),
    }
}
