//! Construction of fully wired interpreter instances.

use crate::binder::CapabilityBinder;
use crate::capability::CapabilityRegistry;
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::ScriptInstance;
use crate::services::HostContext;
use crate::snapshot;
use chrono::{Datelike, NaiveDate};
use mlua::{Lua, Table};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Subdirectory of the executable's directory holding script modules.
pub const ENGINE_DIR: &str = "engine";

/// Global holding the current log file name.
pub const LOG_FILE_GLOBAL: &str = "logFile";

/// Global holding the configured data directory.
pub const SERVER_PATH_GLOBAL: &str = "serverPath";

/// Directory containing the running executable.
///
/// Resolved from the executable itself, never from the working directory.
pub fn executable_dir() -> RuntimeResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| RuntimeError::ExecutableLocation(e.to_string()))?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| RuntimeError::ExecutableLocation(format!("{} has no parent", exe.display())))
}

/// Lua module search pattern rooted at `exe_dir`: `<exe_dir>/engine/?.lua`.
pub fn module_search_path(exe_dir: &Path) -> String {
    exe_dir
        .join(ENGINE_DIR)
        .join("?.lua")
        .to_string_lossy()
        .into_owned()
}

/// Log file name for a rotation date, e.g. `2023-1-5.json`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}-{}-{}.json", date.year(), date.month(), date.day())
}

/// Builds interpreter instances: binds the registry, sets the one-off globals
/// and installs the configuration snapshot.
pub struct InstanceConfigurator {
    registry: Arc<CapabilityRegistry>,
    host: Arc<HostContext>,
    search_path: String,
    next_id: AtomicU64,
}

impl InstanceConfigurator {
    /// Create a configurator rooted at the running executable's directory.
    ///
    /// Fails if that directory cannot be resolved; without it the module
    /// search path is unknown and no instance can be configured.
    pub fn new(registry: Arc<CapabilityRegistry>, host: Arc<HostContext>) -> RuntimeResult<Self> {
        let exe_dir = executable_dir()?;
        Ok(Self::with_executable_dir(registry, host, &exe_dir))
    }

    /// Create a configurator rooted at an explicit directory.
    pub fn with_executable_dir(
        registry: Arc<CapabilityRegistry>,
        host: Arc<HostContext>,
        exe_dir: &Path,
    ) -> Self {
        Self {
            registry,
            host,
            search_path: module_search_path(exe_dir),
            next_id: AtomicU64::new(1),
        }
    }

    /// The `package.path` every instance receives.
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    /// Build one fully configured instance.
    pub fn configure(&self) -> RuntimeResult<ScriptInstance> {
        let lua = Lua::new();
        lua.set_app_data(Arc::clone(&self.host));

        CapabilityBinder::new(&lua).bind_registry(&self.registry)?;

        let globals = lua.globals();
        globals.set(
            LOG_FILE_GLOBAL,
            log_file_name(self.host.last_log_rotation()),
        )?;
        globals.set(SERVER_PATH_GLOBAL, self.host.config().datapack.as_str())?;

        let package: Table = globals.get("package")?;
        package.set("path", self.search_path.as_str())?;

        snapshot::install(&lua, self.host.config())?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(instance = id, "Configured interpreter instance");
        Ok(ScriptInstance::new(id, lua))
    }
}
