//! `session`: the current request's session.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{with_exchange, CapabilityModule};
use mlua::Value;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("session")
        .function("isLogged", |lua, ()| {
            with_exchange(lua, |ex| ex.session().is_logged())
        })
        .function("isAdmin", |lua, ()| {
            with_exchange(lua, |ex| ex.session().is_admin())
        })
        .function("getFlash", |lua, key: String| {
            with_exchange(lua, |ex| ex.session().take_flash(&key))
        })
        .function("setFlash", |lua, (key, message): (String, String)| {
            with_exchange(lua, |ex| ex.session().set_flash(key, message))
        })
        .function("get", |lua, key: String| {
            let value = with_exchange(lua, |ex| ex.session().get(&key).cloned())?;
            match value {
                Some(value) => to_lua(lua, &value),
                None => Ok(Value::Nil),
            }
        })
        .function("set", |lua, (key, value): (String, Value)| {
            let value = to_json(lua, value)?;
            with_exchange(lua, |ex| ex.session().set(key, value))
        })
        .function("destroy", |lua, ()| {
            with_exchange(lua, |ex| ex.session().destroy())
        })
        .function("loggedAccount", |lua, ()| {
            let account = with_exchange(lua, |ex| ex.session().account().cloned())?;
            match account {
                Some(account) => to_lua(lua, &account),
                None => Ok(Value::Nil),
            }
        })
}
