use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How long-running activities are polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Delay between two status requests, in milliseconds.
    pub interval_ms: u64,
    /// Number of status requests after which the activity counts as timed out.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_attempts: 600,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
        }
    }

    /// A policy that polls back-to-back. Mostly useful against in-process gateways.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(Duration::ZERO, max_attempts)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The same policy with at least one status request allowed.
    pub(crate) fn at_least_once(self) -> Self {
        if self.max_attempts == 0 {
            log::warn!("poll max_attempts of 0 raised to 1");
        }
        Self {
            max_attempts: self.max_attempts.max(1),
            ..self
        }
    }
}

/// Where a rewired edge ends up in `EdgesInternal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrdering {
    /// Edges entering the destination port are taken out of the list and only
    /// the last of them, rewired, is appended at the end. Earlier matches are
    /// dropped.
    #[default]
    LastMatchAppended,
    /// Every matched edge is rewired and kept; the last one moves to the end.
    KeepMatchesMoveLast,
    /// Every edge keeps its position.
    Preserve,
}

/// Knobs for the graph mutation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationPolicy {
    /// Refuse to add a module whose id is already present in the graph.
    pub reject_duplicate_ids: bool,
    /// Turn silent lookup misses of `set_parameter` into errors.
    pub strict_lookup: bool,
    pub edge_ordering: EdgeOrdering,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        Self {
            reject_duplicate_ids: true,
            strict_lookup: false,
            edge_ordering: EdgeOrdering::default(),
        }
    }
}

/// Client configuration, loadable from a JSON file. Every section is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub poll: PollPolicy,
    pub mutation: MutationPolicy,
}

impl StudioConfig {
    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StudioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| StudioError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self, StudioError> {
        let config: StudioConfig =
            serde_json::from_str(content).map_err(|e| StudioError::Config(e.to_string()))?;
        if config.poll.max_attempts == 0 {
            return Err(StudioError::Config(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
