use crate::workflow::TaskName;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to read bundle '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse bundle: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure of the external completion engine. Always fatal to the run.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Malformed completion output: {0}")]
    Malformed(String),

    #[error("Completion does not match schema '{schema}': {source}")]
    SchemaMismatch {
        schema: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No fixture response at '{0}'")]
    MissingFixture(PathBuf),
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No JSON object found in output")]
    NoJson,
}

impl From<ParserError> for CompletionError {
    fn from(err: ParserError) -> Self {
        CompletionError::Malformed(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Task {task} passed its guard but {detail}")]
    GuardInconsistency { task: TaskName, detail: String },

    #[error("Task {task} aborted: {message}")]
    TaskAborted { task: TaskName, message: String },

    #[error("Internal workflow error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Task {0} is registered more than once")]
    DuplicateTask(TaskName),

    #[error("Task {0} is reserved for the join step")]
    ReservedName(TaskName),

    #[error("Workflow has no fan-out tasks")]
    Empty,

    #[error("Invalid keyword pattern: {0}")]
    Keywords(#[from] regex::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Failed to write event: {0}")]
    WriteEvent(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
