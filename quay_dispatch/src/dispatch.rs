use quay_collections::{Hash, Slot};
use quay_core::{Context, Result};
use tracing::{info, warn};

use crate::{DispatcherConfig, QueueConfig};

/// Key namespace used by [`Dispatch::with_context`]
pub const DEFAULT_NAMESPACE: &str = "quay";

/// Reads and mutates the dispatcher record and the queue configurations.
///
/// Mutations are read-modify-write of a single record without locking, so
/// concurrent operators can overwrite each other's change.
#[derive(Clone)]
pub struct Dispatch {
    record: Slot<DispatcherConfig>,
    queues: Hash<QueueConfig>,
}

impl Dispatch {
    pub fn with_context(context: Context) -> Self {
        Self::with_namespace(context, DEFAULT_NAMESPACE)
    }

    /// Keep the record at `{namespace}:config:dispatcher` and the queue
    /// configurations at `{namespace}:config:queue`
    pub fn with_namespace(context: Context, namespace: &str) -> Self {
        Self {
            record: Slot::with_context(context.clone(), format!("{namespace}:config:dispatcher")),
            queues: Hash::with_context(context, format!("{namespace}:config:queue")),
        }
    }

    pub fn queue_configs(&self) -> &Hash<QueueConfig> {
        &self.queues
    }

    /// The stored record, `None` when there is none yet.
    ///
    /// A record that does not decode is a [`quay_core::QuayError::Decode`]
    /// error, so it is never mistaken for a missing one and overwritten.
    pub async fn get_dispatcher_config(&self) -> Result<Option<DispatcherConfig>> {
        self.record.fetch().await
    }

    pub async fn set_dispatcher_config(&self, config: &DispatcherConfig) -> Result<()> {
        self.record.set(config).await
    }

    /// Make sure a dispatcher record exists and has queue weights.
    ///
    /// A missing record is created empty; an empty `queue_weight` is seeded
    /// from the configured queues. The record is written only when one of
    /// those happened.
    pub async fn bootstrap(&self) -> Result<DispatcherConfig> {
        let (mut config, mut changed) = match self.record.fetch().await? {
            Some(config) => (config, false),
            None => {
                info!(key = %self.record.name(), "Creating dispatcher config");
                (DispatcherConfig::default(), true)
            }
        };

        if config.queue_weight.is_empty() {
            let queues = self.configured_queues().await?;
            if !queues.is_empty() {
                config.seed_queue_weights(queues.iter().map(|(name, qc)| (name.as_str(), qc)));
                info!(queues = queues.len(), "Seeded dispatcher queue weights");
                changed = true;
            }
        }

        if changed {
            self.record.set(&config).await?;
        }
        Ok(config)
    }

    /// Give every configured queue a weight entry, keeping existing ones
    pub async fn sync_queue_weights(&self) -> Result<Vec<String>> {
        let queues = self.configured_queues().await?;
        let mut config = self.current().await?;
        let added =
            config.fill_missing_queue_weights(queues.iter().map(|(name, qc)| (name.as_str(), qc)));
        if !added.is_empty() {
            self.record.set(&config).await?;
            info!(added = ?added, "Added missing queue weights");
        }
        Ok(added)
    }

    pub async fn set_queue_weight(&self, queue: &str, weight: u32) -> Result<()> {
        let mut config = self.current().await?;
        config.queue_weight.insert(queue.to_string(), weight);
        self.record.set(&config).await
    }

    pub async fn set_worker_weight(&self, worker: &str, weight: u32) -> Result<()> {
        let mut config = self.current().await?;
        config.worker_weight.insert(worker.to_string(), weight);
        self.record.set(&config).await
    }

    /// Drop a worker's weight; true if it had one
    pub async fn remove_worker(&self, worker: &str) -> Result<bool> {
        let mut config = self.current().await?;
        if config.worker_weight.remove(worker).is_none() {
            return Ok(false);
        }
        self.record.set(&config).await?;
        info!(worker = %worker, "Removed worker from dispatcher config");
        Ok(true)
    }

    async fn current(&self) -> Result<DispatcherConfig> {
        Ok(self.record.fetch().await?.unwrap_or_default())
    }

    /// Every configured queue; one whose settings do not decode still
    /// counts, with default settings
    async fn configured_queues(&self) -> Result<Vec<(String, QueueConfig)>> {
        let mut queues = Vec::new();
        for name in self.queues.keys().await? {
            match self.queues.get(&name).await? {
                Some(config) => queues.push((name, config)),
                None if self.queues.contains(&name).await? => {
                    warn!(queue = %name, "Queue config does not decode, using defaults");
                    queues.push((name, QueueConfig::default()));
                }
                None => {}
            }
        }
        Ok(queues)
    }
}
