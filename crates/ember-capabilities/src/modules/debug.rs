//! `debug`: value inspection from scripts.

use ember_runtime::convert::to_json;
use ember_runtime::CapabilityModule;
use mlua::{Lua, Value};
use tracing::info;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("debug").function("value", |lua, value: Value| {
        let text = describe(lua, value);
        info!(target: "ember::script", "{}", text);
        Ok(text)
    })
}

/// Strings as-is, data as pretty JSON, anything else by type name.
fn describe(lua: &Lua, value: Value) -> String {
    match value {
        Value::String(s) => s.to_string_lossy(),
        other => match to_json(lua, other.clone()) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_default(),
            Err(_) => format!("<{}>", other.type_name()),
        },
    }
}
