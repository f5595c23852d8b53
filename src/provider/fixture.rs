use super::{CompletionPort, CompletionRequest};
use crate::error::CompletionError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Replays canned answers from `<dir>/<schema name>.json`.
pub struct FixtureCompletion {
    pub dir: PathBuf,
}

#[async_trait]
impl CompletionPort for FixtureCompletion {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
        let path = self.dir.join(format!("{}.json", request.schema.name));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CompletionError::MissingFixture(path));
            }
            Err(e) => return Err(CompletionError::Io(e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| CompletionError::Malformed(format!("{}: {}", path.display(), e)))
    }
}
