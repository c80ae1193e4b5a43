//! Host assembly: configuration, instance pool and event scheduler.

use anyhow::{Context, Result};
use ember_capabilities::registry;
use ember_runtime::{
    AppConfig, HostContext, InstanceConfigurator, InstancePool, PoolScheduler, Request, Response,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load configuration from `path`, or from the default location.
///
/// An explicit path must exist. Without one, a missing default file yields
/// the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match AppConfig::default_config_path() {
        Some(path) if path.exists() => AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        _ => {
            info!("No configuration file found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// A running host: the pool every script runs on, plus its scheduler.
pub struct Host {
    pool: Arc<InstancePool>,
    scheduler: Arc<PoolScheduler>,
}

impl Host {
    /// Start a host rooted at the running executable's directory.
    pub fn start(host: HostContext) -> Result<Self> {
        let configurator = InstanceConfigurator::new(registry(), Arc::new(host))
            .context("Cannot configure script instances")?;
        Self::with_configurator(configurator)
    }

    /// Start a host whose module search path is rooted at `exe_dir`.
    pub fn start_in(host: HostContext, exe_dir: &Path) -> Result<Self> {
        let configurator =
            InstanceConfigurator::with_executable_dir(registry(), Arc::new(host), exe_dir);
        Self::with_configurator(configurator)
    }

    fn with_configurator(configurator: InstanceConfigurator) -> Result<Self> {
        let policy = configurator.host().config().pool.clone();
        info!(
            modules = configurator.registry().len(),
            search_path = configurator.search_path(),
            "Configuring instance pool"
        );

        let pool = InstancePool::new(configurator, policy);
        // One instance up front so binding defects stop startup.
        pool.warm(1).context("Failed to configure the first script instance")?;
        let scheduler = PoolScheduler::attach(&pool);

        Ok(Self { pool, scheduler })
    }

    pub fn pool(&self) -> &Arc<InstancePool> {
        &self.pool
    }

    pub fn scheduler(&self) -> &Arc<PoolScheduler> {
        &self.scheduler
    }

    /// Run one script file as an internal request.
    pub fn run_script(&self, path: &Path) -> Result<Response> {
        let mut instance = self.pool.checkout()?;
        let response = instance
            .execute_file(path, Request::internal())
            .with_context(|| format!("Script {} failed", path.display()))?;
        Ok(response)
    }

    /// Stop all scheduled events.
    pub fn shutdown(&self) {
        let active = self.scheduler.active();
        self.scheduler.shutdown();
        let stats = self.pool.stats();
        info!(
            events = active,
            created = stats.created,
            idle = stats.idle,
            dropped = stats.dropped,
            "Host stopped"
        );
    }
}
