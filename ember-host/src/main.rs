//! # ember-host
//!
//! Runs ember scripts on a pool of capability-wired Lua instances.
//!
//! ```text
//! ember-host [--config <path>] [script.lua ...]
//!
//!   config.toml ──► HostContext ──► InstanceConfigurator ──► InstancePool
//!                                                              │
//!                          scripts from argv ◄── checkout ─────┤
//!                          events:add jobs   ◄── PoolScheduler ┘
//! ```
//!
//! Each script runs as an internal request; its response is printed as JSON.
//! When scripts leave scheduled events behind, the host keeps running them
//! until Ctrl+C.
//!
//! ## Running
//!
//! ```bash
//! cargo run --bin ember-host -- engine/startup.lua
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin ember-host -- engine/startup.lua
//! ```

use anyhow::Result;
use ember_host::{load_config, logging, Args, Host};
use ember_runtime::HostContext;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::from_env()?;
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.log_level)?;
    info!("Starting ember-host v{}", env!("CARGO_PKG_VERSION"));

    let host = tokio::task::block_in_place(|| Host::start(HostContext::new(config)))?;

    let mut failed = false;
    for script in &args.scripts {
        info!("Running {}", script.display());
        match tokio::task::block_in_place(|| host.run_script(script)) {
            Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
            Err(e) => {
                error!("{:#}", e);
                failed = true;
            }
        }
    }

    if host.scheduler().active() > 0 {
        info!("{} event(s) scheduled, press Ctrl+C to stop", host.scheduler().active());
        tokio::signal::ctrl_c().await?;
        info!("Shutting down...");
    }

    host.shutdown();

    if failed {
        anyhow::bail!("one or more scripts failed");
    }
    Ok(())
}
