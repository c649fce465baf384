use crate::XtaskError;
use crate::cmd;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub(crate) fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// A `cargo` invocation run from the workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CargoStep {
    title: &'static str,
    args: &'static [&'static str],
}

const FMT: CargoStep = CargoStep {
    title: "cargo fmt",
    args: &["fmt", "--check"],
};

/// `cargo nextest` when it is installed, plain `cargo test` otherwise.
fn test_step(nextest_installed: bool) -> CargoStep {
    if nextest_installed {
        CargoStep {
            title: "cargo nextest",
            args: &["nextest", "run", "--workspace"],
        }
    } else {
        CargoStep {
            title: "cargo test",
            args: &["test", "--workspace"],
        }
    }
}

fn nextest_installed(root: &Path) -> bool {
    Command::new("cargo")
        .args(["nextest", "--version"])
        .current_dir(root)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn run_step(root: &Path, step: CargoStep) -> Result<(), XtaskError> {
    println!("\n== {} ==", step.title);
    let what = format!("cargo {}", step.args.join(" "));
    let status = Command::new("cargo")
        .args(step.args)
        .current_dir(root)
        .status()
        .map_err(|e| {
            XtaskError::VerifyFailed(format!("{what}: failed to spawn process: {e}"))
        })?;
    if !status.success() {
        return Err(XtaskError::VerifyFailed(format!("{what}: exited with {status}")));
    }
    Ok(())
}

pub(crate) fn verify(args: Vec<String>) -> Result<(), XtaskError> {
    if !args.is_empty() {
        return Err(XtaskError::Usage);
    }

    let root = workspace_root();
    run_step(&root, FMT)?;
    run_step(&root, test_step(nextest_installed(&root)))?;

    println!("\n== fixture corpus ==");
    cmd::check_corpus(Vec::new())
}
