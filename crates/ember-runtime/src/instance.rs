//! A configured interpreter instance.

use crate::error::RuntimeResult;
use crate::exchange::{Exchange, Request, Response};
use mlua::Lua;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One Lua state wired with every capability module.
///
/// An instance is owned by exactly one caller at a time; the pool hands it out
/// by value and takes it back by value.
pub struct ScriptInstance {
    id: u64,
    lua: Lua,
    uses: u32,
}

impl ScriptInstance {
    pub(crate) fn new(id: u64, lua: Lua) -> Self {
        Self { id, lua, uses: 0 }
    }

    /// Identifier assigned at configuration time, unique per process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of script runs so far.
    pub fn uses(&self) -> u32 {
        self.uses
    }

    /// The underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Run a script file for `request`.
    pub fn execute_file(&mut self, path: &Path, request: Request) -> RuntimeResult<Response> {
        let source = fs::read_to_string(path)?;
        self.execute_source(&format!("@{}", path.display()), &source, request)
    }

    /// Run script source for `request`.
    ///
    /// The request is visible to capability functions only for the duration
    /// of this call; it is removed whether the script succeeds or fails.
    pub fn execute_source(
        &mut self,
        name: &str,
        source: &str,
        request: Request,
    ) -> RuntimeResult<Response> {
        self.uses += 1;
        debug!(instance = self.id, script = name, "Executing script");

        self.lua.set_app_data(Exchange::new(request));
        let outcome = self.lua.load(source).set_name(name).exec();
        let exchange = self.lua.remove_app_data::<Exchange>();

        outcome?;
        Ok(exchange.map(Exchange::into_response).unwrap_or_default())
    }
}

impl fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptInstance")
            .field("id", &self.id)
            .field("uses", &self.uses)
            .finish()
    }
}
