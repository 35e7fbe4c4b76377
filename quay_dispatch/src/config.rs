use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight a queue gets when its configuration does not name one
pub const DEFAULT_QUEUE_WEIGHT: u32 = 0;

/// The persisted record the dispatcher loop reads to share out work.
///
/// Maps are ordered so the stored JSON is stable between writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub queue_weight: BTreeMap<String, u32>,
    #[serde(default)]
    pub worker_weight: BTreeMap<String, u32>,
}

/// Per-queue settings kept in the queue configuration hash
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whatever else operators store for the queue, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl QueueConfig {
    pub fn with_weight(weight: u32) -> Self {
        Self {
            weight,
            ..Default::default()
        }
    }
}

impl DispatcherConfig {
    /// Replace the queue weights with the configured weight of every queue.
    ///
    /// Only meant for an empty `queue_weight`; use
    /// [`DispatcherConfig::fill_missing_queue_weights`] to keep existing entries.
    pub fn seed_queue_weights<'a, I>(&mut self, queues: I)
    where
        I: IntoIterator<Item = (&'a str, &'a QueueConfig)>,
    {
        self.queue_weight = queues
            .into_iter()
            .map(|(name, config)| (name.to_string(), config.weight))
            .collect();
    }

    /// Add weights for queues that have none; returns the names added
    pub fn fill_missing_queue_weights<'a, I>(&mut self, queues: I) -> Vec<String>
    where
        I: IntoIterator<Item = (&'a str, &'a QueueConfig)>,
    {
        let mut added = Vec::new();
        for (name, config) in queues {
            if !self.queue_weight.contains_key(name) {
                self.queue_weight.insert(name.to_string(), config.weight);
                added.push(name.to_string());
            }
        }
        added
    }
}
