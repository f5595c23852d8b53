use super::{CompletionPort, CompletionRequest, ModelTier};
use crate::error::CompletionError;
use crate::parser::parse_completion;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout as tokio_timeout;

pub struct ClaudeCompletion {
    pub binary: PathBuf,
    pub fast_model: String,
    pub standard_model: String,
    pub timeout: Duration,
}

#[async_trait]
impl CompletionPort for ClaudeCompletion {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
        let model = match request.tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Standard => &self.standard_model,
        };

        // A bare name resolves through PATH
        let mut cmd = Command::new(&self.binary);
        // Authenticate with the CLI login, never an inherited API key
        cmd.env_remove("ANTHROPIC_API_KEY");
        cmd.kill_on_drop(true);

        cmd.arg("-p")
            .arg(request.render())
            .arg("--model")
            .arg(model)
            .arg("--output-format")
            .arg("json");

        let output = tokio_timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CompletionError::Timeout(self.timeout))?
            .map_err(CompletionError::Io)?;

        if !output.status.success() {
            return Err(CompletionError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_completion(&stdout)?)
    }
}
