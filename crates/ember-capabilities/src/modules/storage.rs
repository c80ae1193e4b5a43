//! `storage`: persistent key/value data.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{host, CapabilityModule};
use mlua::Value;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("storage")
        .function("get", |lua, key: String| {
            match host(lua)?.storage().get(&key)? {
                Some(value) => to_lua(lua, &value),
                None => Ok(Value::Nil),
            }
        })
        .function("set", |lua, (key, value): (String, Value)| {
            let value = to_json(lua, value)?;
            host(lua)?.storage().set(&key, value)?;
            Ok(())
        })
}
