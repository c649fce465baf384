#![forbid(unsafe_code)]

//! Fixture-driven regression harness for XSLT stylesheets.
//!
//! Every stylesheet under a stylesheet root is paired with a fixture directory that mirrors its
//! relative path (extension stripped). Inside that directory each `input*` file is transformed
//! with the stylesheet, and the result is compared against the single matching `output*` file:
//!
//! ```text
//! src/main/resources/a/b/name.xsl
//! src/test/resources/a/b/name/input1.xml   -> target/resources/a/b/name/input1.xml
//! src/test/resources/a/b/name/output1.json
//! ```
//!
//! The comparison mode follows the detected content type of the produced output: structural XML
//! diff, STRICT JSON equality, or exact bytes. All failures of a run are collected into a
//! [`Report`]; a bad fixture never stops the remaining ones from being evaluated.
//!
//! # Features
//!
//! - `xrust` (default): the pure-Rust XSLT backend [`transform::XrustEngine`].

pub mod compare;
pub mod config;
pub mod error;
pub mod fs;
pub mod harness;
pub mod report;
pub mod resolve;
pub mod transform;

pub use compare::{ContentKind, Discrepancy, XmlDifference};
pub use config::HarnessConfig;
pub use error::{Error, Result, TransformError};
pub use harness::Harness;
pub use report::{Failure, FailureKind, Report};
pub use resolve::{DiscoveryFailure, FixtureLayout, FixturePair, Resolution};
pub use transform::{CompiledStylesheet, TransformOutput, TransformRunner, XsltEngine};

#[cfg(feature = "xrust")]
pub use transform::XrustEngine;
