use crate::XtaskError;
use crate::cmd::workspace_root;
use std::path::PathBuf;
use xslt_fixtures::{Harness, HarnessConfig, XrustEngine};

/// Runs the workspace's own fixture corpus through the real engine.
pub(crate) fn check_corpus(args: Vec<String>) -> Result<(), XtaskError> {
    let mut config_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_path = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => return Err(XtaskError::Usage),
            _ => return Err(XtaskError::Usage),
        }
        i += 1;
    }

    let root = workspace_root();
    let config_path = config_path.unwrap_or_else(|| root.join("xslt-fixtures.yaml"));
    let base = config_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.clone());
    let config = HarnessConfig::from_file(&config_path)?.rooted_at(&base);

    let report = Harness::new(config, XrustEngine).run_all()?;
    if !report.is_success() {
        return Err(XtaskError::CorpusFailed(report.to_string()));
    }
    println!("{}", report.summary());
    Ok(())
}
