//! `cache`: short-lived values shared by every instance.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{host, CapabilityModule};
use mlua::Value;
use std::time::Duration;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("cache")
        .function("get", |lua, key: String| {
            match host(lua)?.cache().get(&key) {
                Some(value) => to_lua(lua, &value),
                None => Ok(Value::Nil),
            }
        })
        .function(
            "set",
            |lua, (key, value, ttl): (String, Value, Option<f64>)| {
                let ttl = ttl
                    .map(|secs| {
                        Duration::try_from_secs_f64(secs)
                            .map_err(|_| mlua::Error::runtime("cache: invalid expiry"))
                    })
                    .transpose()?;
                let value = to_json(lua, value)?;
                host(lua)?.cache().set(&key, value, ttl);
                Ok(())
            },
        )
        .function("delete", |lua, key: String| {
            Ok(host(lua)?.cache().delete(&key))
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
    fn test_set_get_delete() {
        let ok: bool = lua()
            .load(
                r#"
                cache:set("top", {"Alice", "Bob"})
                local top = cache:get("top")
                local deleted = cache:delete("top")
                return top[2] == "Bob" and deleted
                    and cache:get("top") == nil and not cache:delete("top")
                "#,
            )
            .eval()
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_expiry() {
        let lua = lua();
        lua.load(r#"cache:set("flash", 1, 0.01)"#).exec().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let gone: bool = lua.load(r#"return cache:get("flash") == nil"#).eval().unwrap();
        assert!(gone);
    }

    #[test]
    fn test_negative_expiry_raises() {
        assert!(lua().load(r#"cache:set("k", 1, -5)"#).exec().is_err());
    }

    #[test]
    fn test_shared_between_instances() {
        let host = std::sync::Arc::new(HostContext::new(AppConfig::default()));
        let a = mlua::Lua::new();
        let b = mlua::Lua::new();
        for lua in [&a, &b] {
            lua.set_app_data(host.clone());
            ember_runtime::CapabilityBinder::new(lua)
                .bind(&module())
                .unwrap();
        }

        a.load(r#"cache:set("online", 42)"#).exec().unwrap();
        let online: i64 = b.load(r#"return cache:get("online")"#).eval().unwrap();
        assert_eq!(online, 42);
    }
}
