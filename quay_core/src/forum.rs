use parking_lot::RwLock;
use rand::seq::SliceRandom;
use redis::RedisConnectionInfo;
use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Connection, Context, QuayError, Result};

/// Name of the system that single-backend deployments register
pub const DEFAULT_SYSTEM: &str = "default";

/// How every registered system of a forum reaches its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One fixed endpoint per system
    Direct,
    /// Master/replica discovered through sentinel monitors
    Sentinel,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Direct => write!(f, "direct"),
            Mode::Sentinel => write!(f, "sentinel"),
        }
    }
}

/// Central registry that maps logical system names to live backends.
///
/// All registered systems share one [`Mode`]. Registering a system in the
/// other mode drops every earlier registration, so a forum never holds a
/// mixed view. Configure once at startup; switching modes while other tasks
/// are resolving connections is not supported.
#[derive(Clone, Default)]
pub struct Forum {
    registry: Arc<RwLock<Registry>>,
}

struct Registry {
    mode: Mode,
    systems: HashMap<String, System>,
    default_service: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            mode: Mode::Direct,
            systems: HashMap::new(),
            default_service: None,
        }
    }
}

impl Registry {
    fn enter_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        info!(
            from = %self.mode,
            to = %mode,
            dropped = self.systems.len(),
            "Backend mode switched, previous systems cleared"
        );
        self.systems.clear();
        self.mode = mode;
    }
}

enum System {
    Direct(deadpool_redis::Pool),
    Sentinel(Arc<SentinelTopology>),
}

struct SentinelTopology {
    sentinel: tokio::sync::Mutex<Sentinel>,
    services: Vec<String>,
    db: i64,
    socket_timeout: Duration,
}

impl Forum {
    /// Create an empty forum in direct mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forum with the [`DEFAULT_SYSTEM`] pointing at the given Redis URL
    pub fn with_url(redis_url: &str) -> Result<Self> {
        let forum = Self::new();
        forum.configure_url(DEFAULT_SYSTEM, redis_url)?;
        Ok(forum)
    }

    /// Create a forum from `QUAY_*` environment variables
    pub fn try_from_env() -> Result<Self> {
        let forum = Self::new();
        crate::BackendSettings::from_env()?.apply(&forum)?;
        Ok(forum)
    }

    /// Create a context scoped to one registered system
    pub fn system(&self, system: impl ToString) -> Context {
        Context::new(self.clone(), system)
    }

    /// Register `system` as a direct backend at `host:port`, database `db`
    pub fn configure_direct(
        &self,
        system: impl ToString,
        host: &str,
        port: u16,
        db: i64,
    ) -> Result<()> {
        if host.trim().is_empty() {
            return Err(QuayError::Configuration("direct host is empty".to_string()));
        }
        if db < 0 {
            return Err(QuayError::Configuration(format!(
                "database must be non-negative, got {}",
                db
            )));
        }
        self.configure_url(system, &format!("redis://{}:{}/{}", host, port, db))
    }

    /// Register `system` as a direct backend reachable at a Redis URL
    pub fn configure_url(&self, system: impl ToString, redis_url: &str) -> Result<()> {
        let system = system.to_string();
        let pool = deadpool_redis::Config::from_url(redis_url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))?;

        let mut registry = self.registry.write();
        registry.enter_mode(Mode::Direct);
        registry.systems.insert(system.clone(), System::Direct(pool));
        debug!(system = %system, "Direct system registered");
        Ok(())
    }

    /// Register `system` as a sentinel-monitored topology.
    ///
    /// `monitors` are the sentinel endpoints, `services` the monitored
    /// service names to pick from on each resolution, `socket_timeout` the
    /// number of seconds a master/replica discovery may take.
    pub fn configure_sentinel(
        &self,
        system: impl ToString,
        monitors: Vec<(String, u16)>,
        services: Vec<String>,
        db: i64,
        socket_timeout: f64,
    ) -> Result<()> {
        let system = system.to_string();
        if monitors.is_empty() {
            return Err(QuayError::Configuration(
                "sentinel needs at least one monitor endpoint".to_string(),
            ));
        }
        if services.is_empty() || services.iter().any(|s| s.trim().is_empty()) {
            return Err(QuayError::Configuration(
                "sentinel needs non-empty service names".to_string(),
            ));
        }
        if db < 0 {
            return Err(QuayError::Configuration(format!(
                "database must be non-negative, got {}",
                db
            )));
        }
        if !socket_timeout.is_finite() || socket_timeout <= 0.0 {
            return Err(QuayError::Configuration(format!(
                "socket timeout must be a positive number of seconds, got {}",
                socket_timeout
            )));
        }

        let urls: Vec<String> = monitors
            .iter()
            .map(|(host, port)| format!("redis://{}:{}", host, port))
            .collect();
        let sentinel =
            Sentinel::build(urls).map_err(|e| QuayError::Configuration(e.to_string()))?;

        let topology = SentinelTopology {
            sentinel: tokio::sync::Mutex::new(sentinel),
            services,
            db,
            socket_timeout: Duration::from_secs_f64(socket_timeout),
        };

        let mut registry = self.registry.write();
        registry.enter_mode(Mode::Sentinel);
        registry
            .systems
            .insert(system.clone(), System::Sentinel(Arc::new(topology)));
        debug!(system = %system, monitors = monitors.len(), "Sentinel system registered");
        Ok(())
    }

    /// Pin every sentinel resolution to one service name instead of picking randomly
    pub fn set_default_service(&self, service: impl ToString) {
        self.registry.write().default_service = Some(service.to_string());
    }

    pub fn mode(&self) -> Mode {
        self.registry.read().mode
    }

    /// Names of all registered systems, sorted
    pub fn systems(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.read().systems.keys().cloned().collect();
        names.sort();
        names
    }

    /// The sentinel service the next resolution of `system` would use.
    ///
    /// Returns `None` for direct systems.
    pub fn pick_service(&self, system: &str) -> Result<Option<String>> {
        let registry = self.registry.read();
        match registry.systems.get(system) {
            None => Err(QuayError::UnknownSystem(system.to_string())),
            Some(System::Direct(_)) => Ok(None),
            Some(System::Sentinel(topology)) => choose_service(
                registry.default_service.as_deref(),
                &topology.services,
            )
            .map(Some),
        }
    }

    /// Get a live connection to the backend of `system`.
    ///
    /// Sentinel systems connect to the current master when `want_writable`
    /// is set and to a replica otherwise.
    pub async fn resolve(&self, system: &str, want_writable: bool) -> Result<Connection> {
        let route = {
            let registry = self.registry.read();
            match registry.systems.get(system) {
                None => return Err(QuayError::UnknownSystem(system.to_string())),
                Some(System::Direct(pool)) => Route::Direct(pool.clone()),
                Some(System::Sentinel(topology)) => Route::Sentinel(
                    topology.clone(),
                    choose_service(registry.default_service.as_deref(), &topology.services)?,
                ),
            }
        };

        match route {
            Route::Direct(pool) => Ok(Connection::Pooled(pool.get().await?)),
            Route::Sentinel(topology, service) => {
                debug!(
                    system = %system,
                    service = %service,
                    writable = want_writable,
                    "Resolving through sentinel"
                );
                topology.connect(&service, want_writable).await
            }
        }
    }
}

enum Route {
    Direct(deadpool_redis::Pool),
    Sentinel(Arc<SentinelTopology>, String),
}

impl SentinelTopology {
    async fn connect(&self, service: &str, want_writable: bool) -> Result<Connection> {
        let node = SentinelNodeConnectionInfo {
            redis_connection_info: Some(RedisConnectionInfo {
                db: self.db,
                ..Default::default()
            }),
            ..Default::default()
        };

        // waiting for other resolutions is not part of the socket timeout
        let mut sentinel = self.sentinel.lock().await;
        let discovery = async {
            if want_writable {
                sentinel.async_master_for(service, Some(&node)).await
            } else {
                sentinel.async_replica_for(service, Some(&node)).await
            }
        };
        let client = tokio::time::timeout(self.socket_timeout, discovery)
            .await
            .map_err(|_| QuayError::Timeout(self.socket_timeout))??;

        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Connection::Discovered(conn))
    }
}

fn choose_service(pinned: Option<&str>, services: &[String]) -> Result<String> {
    if let Some(service) = pinned {
        return Ok(service.to_string());
    }
    services
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| QuayError::Configuration("sentinel has no services".to_string()))
}
