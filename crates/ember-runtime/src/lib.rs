//! # ember-runtime
//!
//! Pooled Lua interpreter instances for the ember host.
//!
//! This crate provides:
//! - Capability modules: named groups of host functions exposed to scripts
//! - Binding of modules into an interpreter, as global tables or object types
//! - Instance configuration: globals, module search path, config snapshot
//! - A concurrency-safe pool that configures each instance once and reuses it
//!
//! ## Instance Lifecycle
//!
//! ```text
//! InstancePool::get ─┬─ idle instance available ─▶ reuse (LIFO)
//!                    └─ pool empty ─▶ InstanceConfigurator::configure
//!                                       ├─ bind every capability module
//!                                       ├─ logFile, serverPath, package.path
//!                                       └─ app config snapshot
//! ScriptInstance::execute_file(request) ─▶ Response
//! InstancePool::put (or drop the PooledInstance guard)
//! ```
//!
//! An instance is owned by exactly one caller between checkout and return.
//! Per-request state is removed after every run, so a reused instance never
//! sees a previous request.

pub mod binder;
pub mod capability;
pub mod config;
pub mod configurator;
pub mod convert;
pub mod error;
pub mod exchange;
pub mod instance;
pub mod memory;
pub mod pool;
pub mod scheduler;
pub mod services;
pub mod snapshot;

pub use binder::CapabilityBinder;
pub use capability::{
    new_object, object_state, object_state_mut, Binding, CapabilityModule, CapabilityRegistry,
    Exposure, GlobalFactory, HostFunction,
};
pub use config::{AppConfig, PoolConfig};
pub use configurator::{executable_dir, log_file_name, module_search_path, InstanceConfigurator};
pub use error::{RuntimeError, RuntimeResult};
pub use exchange::{with_exchange, Exchange, Request, Response, Session};
pub use instance::ScriptInstance;
pub use memory::{MemoryCache, MemoryStore};
pub use pool::{InstancePool, PoolStats, PooledInstance};
pub use scheduler::PoolScheduler;
pub use services::{host, HostContext};
