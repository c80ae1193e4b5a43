//! `config`: configuration lookups by path.
//!
//! `config.get("PayPal.Currency")` walks the script-facing configuration;
//! a single name not found there is looked up in the `[custom]` table.

use ember_runtime::convert::to_lua;
use ember_runtime::{host, CapabilityModule};
use mlua::Value;
use serde_json::Value as JsonValue;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("config").function("get", |lua, path: String| {
        let host = host(lua)?;
        let config = serde_json::to_value(host.config()).map_err(mlua::Error::external)?;

        let found = lookup(&config, &path).or_else(|| lookup(config.get("Custom")?, &path));
        match found {
            Some(value) => to_lua(lua, value),
            None => Ok(Value::Nil),
        }
    })
}

fn lookup<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(root, |node, segment| node.get(segment))
}
