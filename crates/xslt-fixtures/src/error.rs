use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list directory {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not under root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("malformed XML in {}: {message}", path.display())]
    XmlParse { path: PathBuf, message: String },

    #[error("malformed JSON in {}: {source}", path.display())]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse YAML configuration: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON configuration: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Failures raised while compiling or executing a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("stylesheet {} failed to compile: {message}", stylesheet.display())]
    Compile { stylesheet: PathBuf, message: String },

    #[error("stylesheet {} uses a disabled extension capability: {what}", stylesheet.display())]
    ExtensionDenied { stylesheet: PathBuf, what: String },

    #[error("transforming {} with {} failed: {message}", input.display(), stylesheet.display())]
    Runtime {
        stylesheet: PathBuf,
        input: PathBuf,
        message: String,
    },
}
