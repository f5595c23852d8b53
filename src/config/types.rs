use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Upper bound for a single completion call
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,

    /// Maximum fan-out tasks in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub surgery: SurgeryConfig,

    /// Write summary.json / summary.md here after a successful run
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    ClaudeCli,
    CodexCli,
    Fixture,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::ClaudeCli => write!(f, "claude_cli"),
            Provider::CodexCli => write!(f, "codex_cli"),
            Provider::Fixture => write!(f, "fixture"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "claude_cli" | "claude" => Ok(Provider::ClaudeCli),
            "codex_cli" | "codex" => Ok(Provider::CodexCli),
            "fixture" => Ok(Provider::Fixture),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude_cli: ClaudeCliConfig,

    #[serde(default)]
    pub codex_cli: CodexCliConfig,

    #[serde(default)]
    pub fixture: FixtureConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ClaudeCliConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_claude_fast_model")]
    pub fast_model: String,

    #[serde(default = "default_claude_standard_model")]
    pub standard_model: String,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
            fast_model: default_claude_fast_model(),
            standard_model: default_claude_standard_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CodexCliConfig {
    #[serde(default = "default_codex_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_codex_fast_model")]
    pub fast_model: String,

    #[serde(default = "default_codex_standard_model")]
    pub standard_model: String,
}

impl Default for CodexCliConfig {
    fn default() -> Self {
        Self {
            binary: default_codex_binary(),
            fast_model: default_codex_fast_model(),
            standard_model: default_codex_standard_model(),
        }
    }
}

/// Canned responses, one `<schema name>.json` file per expected shape
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FixtureConfig {
    #[serde(default = "default_fixture_dir")]
    pub dir: PathBuf,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            dir: default_fixture_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SurgeryConfig {
    /// Most recent notes always sent along with keyword matches
    #[serde(default = "default_recent_notes")]
    pub recent_notes: usize,

    /// Added to the built-in perioperative vocabulary
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}

impl Default for SurgeryConfig {
    fn default() -> Self {
        Self {
            recent_notes: default_recent_notes(),
            extra_keywords: Vec::new(),
        }
    }
}
