use super::{CompletionPort, CompletionRequest, ModelTier};
use crate::error::CompletionError;
use crate::parser::parse_completion;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout as tokio_timeout;

pub struct CodexCompletion {
    pub binary: PathBuf,
    pub fast_model: String,
    pub standard_model: String,
    pub timeout: Duration,
}

#[async_trait]
impl CompletionPort for CodexCompletion {
    fn name(&self) -> &'static str {
        "codex_cli"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
        let model = match request.tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Standard => &self.standard_model,
        };

        // Final assistant message lands here
        let out_file = NamedTempFile::new()?;

        let mut cmd = Command::new(&self.binary);

        cmd.arg("exec")
            .arg("--model")
            .arg(model)
            .arg("--output-last-message")
            .arg(out_file.path())
            // Read prompt from stdin
            .arg("-");

        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.render().as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = tokio_timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CompletionError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(CompletionError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let last_message = tokio::fs::read_to_string(out_file.path()).await?;
        Ok(parse_completion(&last_message)?)
    }
}
