//! Fan-out/join summarization of clinical record bundles.
//!
//! Six independent analyses run concurrently over one immutable
//! [`bundle::InputBundle`]; their results feed a single clinical summary.
//! Progress is reported through a [`workflow::ProgressSink`] and every
//! model call goes through a [`provider::CompletionPort`].

pub mod bundle;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod provider;
pub mod session;
pub mod tasks;
pub mod workflow;
