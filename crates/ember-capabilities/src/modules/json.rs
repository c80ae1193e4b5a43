//! `json`: conversion between JSON text and Lua values.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::CapabilityModule;
use mlua::Value;
use serde_json::Value as JsonValue;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("json")
        .function("marshal", |lua, value: Value| {
            let value = to_json(lua, value)?;
            serde_json::to_string(&value).map_err(mlua::Error::external)
        })
        .function("unmarshal", |lua, text: String| {
            let value: JsonValue = serde_json::from_str(&text)
                .map_err(|e| mlua::Error::runtime(format!("json: {e}")))?;
            to_lua(lua, &value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::{AppConfig, HostContext};

    fn lua() -> mlua::Lua {
        lua_for(module(), HostContext::new(AppConfig::default()))
    }

    #[test]
    fn test_marshal() {
        let text: String = lua()
            .load(r#"return json:marshal({name = "Bob", level = 8})"#)
            .eval()
            .unwrap();
        let value: JsonValue = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({"name": "Bob", "level": 8}));
    }

    #[test]
    fn test_unmarshal() {
        let ok: bool = lua()
            .load(
                r#"
                local v = json:unmarshal(
                    '{"players": [{"name": "Alice"}, {"name": "Bob"}], "gone": null}'
                )
                return #v.players == 2 and v.players[2].name == "Bob" and v.gone == nil
                "#,
            )
            .eval()
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_errors() {
        let lua = lua();
        assert!(lua.load(r#"json:unmarshal("{broken")"#).exec().is_err());
        assert!(lua.load("json:marshal(print)").exec().is_err());
    }
}
