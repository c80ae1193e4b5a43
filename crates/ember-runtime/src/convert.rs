//! Conversions between host values and Lua values.
//!
//! Everything crossing the boundary as structured data goes through serde,
//! so a host struct becomes a fresh Lua table and never a view into host state.

use mlua::{DeserializeOptions, Lua, LuaSerdeExt, SerializeOptions, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

fn serialize_options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

/// Convert a serializable host value into a Lua value. `None` and JSON `null`
/// become `nil`.
pub fn to_lua<T: Serialize + ?Sized>(lua: &Lua, value: &T) -> mlua::Result<Value> {
    lua.to_value_with(value, serialize_options())
}

/// Convert a Lua value into a host type.
pub fn from_lua<T: DeserializeOwned>(lua: &Lua, value: Value) -> mlua::Result<T> {
    lua.from_value_with(value, DeserializeOptions::new())
}

/// Convert a Lua value into JSON. Functions and other host-only values are rejected.
pub fn to_json(lua: &Lua, value: Value) -> mlua::Result<serde_json::Value> {
    from_lua(lua, value)
}
