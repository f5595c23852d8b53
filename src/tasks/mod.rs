//! The six fan-out analyses, the join task, and the shapes they produce.
//!
//! Every result type derives `JsonSchema`; its schema is what the
//! completion engine is asked to fill in, and its schema name doubles as
//! the fixture file name for the offline provider.

mod clinical;
mod labs;
mod notes;
mod prescriptions;
mod radiology;
mod surgery;
mod vitals;

pub use clinical::*;
pub use labs::*;
pub use notes::*;
pub use prescriptions::*;
pub use radiology::*;
pub use surgery::*;
pub use vitals::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Four-step severity scale shared by several analyses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    High,
    Critical,
}

/// Ordered most urgent first, so sorting by it yields priority order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
    #[default]
    Low,
}
