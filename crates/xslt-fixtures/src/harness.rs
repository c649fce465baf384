//! Corpus-wide run: discover stylesheets, resolve their fixtures, transform, compare.

use crate::compare::{self, Discrepancy};
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::fs::{FileListing, OsListing};
use crate::report::Report;
use crate::resolve::{self, FixturePair, Resolution};
use crate::transform::{CompiledStylesheet, TransformRunner, XsltEngine};
use std::path::{Path, PathBuf};

pub struct Harness<E, L = OsListing> {
    config: HarnessConfig,
    runner: TransformRunner<E>,
    listing: L,
}

impl<E: XsltEngine> Harness<E, OsListing> {
    pub fn new(config: HarnessConfig, engine: E) -> Self {
        Self::with_listing(config, engine, OsListing)
    }
}

impl<E: XsltEngine, L: FileListing> Harness<E, L> {
    pub fn with_listing(config: HarnessConfig, engine: E, listing: L) -> Self {
        let runner = TransformRunner::new(engine, config.layout());
        Self {
            config,
            runner,
            listing,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Every stylesheet under the stylesheet root, recursively, in path order.
    pub fn discover_stylesheets(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .listing
            .walk_files(&self.config.stylesheet_root)?
            .into_iter()
            .filter(|p| self.config.is_stylesheet(p))
            .collect())
    }

    pub fn resolve(&self, stylesheet: &Path) -> Result<Resolution> {
        resolve::resolve(&self.listing, self.runner.layout(), stylesheet)
    }

    /// Runs every stylesheet of the corpus. Only failing to list the stylesheet root itself is an
    /// error; everything else ends up in the report.
    pub fn run_all(&self) -> Result<Report> {
        let ignore_ws = compare::xml::init_ignore_whitespace(self.config.ignore_whitespace);
        if ignore_ws != self.config.ignore_whitespace {
            tracing::warn!(
                requested = self.config.ignore_whitespace,
                effective = ignore_ws,
                "XML whitespace mode was already fixed for this process"
            );
        }

        let stylesheets = self.discover_stylesheets()?;
        tracing::info!(
            root = %self.config.stylesheet_root.display(),
            count = stylesheets.len(),
            engine = self.runner.engine().name(),
            "discovered stylesheets"
        );

        let mut report = Report::default();
        for stylesheet in &stylesheets {
            self.run_stylesheet(stylesheet, &mut report);
        }
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    pub fn run_stylesheet(&self, stylesheet: &Path, report: &mut Report) {
        report.stylesheets += 1;

        let resolution = match self.resolve(stylesheet) {
            Ok(r) => r,
            Err(err) => {
                report.record_error(stylesheet, None, &err);
                return;
            }
        };
        if resolution.is_untested() {
            report.untested.push(stylesheet.to_path_buf());
            return;
        }
        for failure in &resolution.failures {
            report.record_discovery(stylesheet, failure);
        }
        if resolution.cases.is_empty() {
            return;
        }

        tracing::info!(
            stylesheet = %stylesheet.display(),
            cases = resolution.cases.len(),
            "testing stylesheet"
        );
        let compiled = self.runner.compile(stylesheet);
        for pair in &resolution.cases {
            report.cases += 1;
            let outcome = match &compiled {
                Ok(compiled) => self.run_case(compiled, pair),
                Err(err) => {
                    // A stylesheet that does not compile fails each of its fixtures.
                    report.record_error(stylesheet, Some(&pair.input), err);
                    continue;
                }
            };
            match outcome {
                Ok(discrepancies) => report.record_comparison(stylesheet, &pair.input, discrepancies),
                Err(err) => report.record_error(stylesheet, Some(&pair.input), &err),
            }
        }
    }

    fn run_case(&self, stylesheet: &CompiledStylesheet, pair: &FixturePair) -> Result<Vec<Discrepancy>> {
        let actual = self.runner.run_compiled(&pair.input, stylesheet)?;
        compare::compare(&pair.expected, &actual)
    }
}
