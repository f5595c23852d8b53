mod claude;
mod codex;
mod fixture;

pub use claude::ClaudeCompletion;
pub use codex::CodexCompletion;
pub use fixture::FixtureCompletion;

use crate::config::{Config, Provider};
use crate::error::CompletionError;
use crate::workflow::TaskName;
use async_trait::async_trait;
use schemars::gen::SchemaGenerator;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Which model class a request should run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Standard,
}

/// Expected output shape of a completion, derived from the Rust result type
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub name: String,
    pub schema: RootSchema,
}

impl SchemaDescriptor {
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            name: T::schema_name(),
            schema: SchemaGenerator::default().into_root_schema_for::<T>(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Task issuing the call, for logging only
    pub task: TaskName,
    pub tier: ModelTier,
    pub system_prompt: String,
    pub prompt: String,
    pub schema: SchemaDescriptor,
}

impl CompletionRequest {
    /// Single prompt text for CLIs that take no separate system prompt
    pub fn render(&self) -> String {
        format!(
            "{}\n\n---\n\n{}\n\n---\n\n\
            Respond with a single JSON object conforming to the JSON Schema `{}` below. \
            Output only the JSON object, no commentary.\n\n```json\n{}\n```",
            self.system_prompt.trim(),
            self.prompt.trim(),
            self.schema.name,
            self.schema.to_pretty_json()
        )
    }
}

/// External structured-completion capability.
///
/// Implementations must tolerate concurrent calls; the workflow issues at
/// most one call per task at a time.
#[async_trait]
pub trait CompletionPort: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError>;
}

/// Call the port and convert its answer into `T`.
pub async fn complete_structured<T>(
    port: &dyn CompletionPort,
    task: TaskName,
    tier: ModelTier,
    system_prompt: &str,
    prompt: String,
) -> Result<T, CompletionError>
where
    T: DeserializeOwned + JsonSchema,
{
    let request = CompletionRequest {
        task,
        tier,
        system_prompt: system_prompt.to_string(),
        prompt,
        schema: SchemaDescriptor::of::<T>(),
    };

    debug!(
        "{} requesting {} from {} ({} prompt chars)",
        task,
        request.schema.name,
        port.name(),
        request.prompt.len()
    );

    let value = port.complete(&request).await?;
    serde_json::from_value(value).map_err(|source| CompletionError::SchemaMismatch {
        schema: request.schema.name.clone(),
        source,
    })
}

/// Create the completion port selected by the config
pub fn create_port(config: &Config) -> Arc<dyn CompletionPort> {
    match config.provider {
        Provider::ClaudeCli => Arc::new(ClaudeCompletion {
            binary: config.providers.claude_cli.binary.clone(),
            fast_model: config.providers.claude_cli.fast_model.clone(),
            standard_model: config.providers.claude_cli.standard_model.clone(),
            timeout: config.timeout(),
        }),
        Provider::CodexCli => Arc::new(CodexCompletion {
            binary: config.providers.codex_cli.binary.clone(),
            fast_model: config.providers.codex_cli.fast_model.clone(),
            standard_model: config.providers.codex_cli.standard_model.clone(),
            timeout: config.timeout(),
        }),
        Provider::Fixture => Arc::new(FixtureCompletion {
            dir: config.providers.fixture.dir.clone(),
        }),
    }
}
