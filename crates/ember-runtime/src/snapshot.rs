//! The `app` global: a script-readable copy of the host configuration.
//!
//! ```lua
//! app.URL, app.Port, app.Mode, app.Datapack   -- hot-path shortcuts
//! app.Main.LogLevel                           -- top-level settings
//! app.PayPal.Currency, app.SSL.Enabled, ...   -- one table per section
//! app.Custom.foo                              -- free-form [custom] table
//! ```
//!
//! Every table is freshly built from the configuration, so a script writing
//! into `app` only changes its own copy.

use crate::config::AppConfig;
use crate::convert::to_lua;
use crate::error::RuntimeResult;
use mlua::{Lua, Table};
use serde_json::Value as JsonValue;

/// Name of the configuration global.
pub const APP_GLOBAL: &str = "app";

/// Build the `app` table for `config`.
pub fn build(lua: &Lua, config: &AppConfig) -> RuntimeResult<Table> {
    let app = lua.create_table()?;

    app.set("Main", to_lua(lua, &main_settings(config)?)?)?;
    app.set("PayPal", to_lua(lua, &config.paypal)?)?;
    app.set("Captcha", to_lua(lua, &config.captcha)?)?;
    app.set("Mail", to_lua(lua, &config.mail)?)?;
    app.set("PayGol", to_lua(lua, &config.paygol)?)?;
    app.set("SSL", to_lua(lua, &config.ssl)?)?;
    app.set("Custom", to_lua(lua, &config.custom)?)?;

    app.set("URL", config.url.as_str())?;
    app.set("Port", config.port)?;
    app.set("Mode", config.mode.as_str())?;
    app.set("Datapack", config.datapack.as_str())?;

    Ok(app)
}

/// Build the snapshot and set it as the `app` global.
pub fn install(lua: &Lua, config: &AppConfig) -> RuntimeResult<()> {
    let app = build(lua, config)?;
    lua.globals().set(APP_GLOBAL, app)?;
    Ok(())
}

/// Top-level settings only; sections get their own tables.
fn main_settings(config: &AppConfig) -> RuntimeResult<JsonValue> {
    let mut main = serde_json::to_value(config)?;
    if let Some(fields) = main.as_object_mut() {
        fields.retain(|_, value| !value.is_object());
    }
    Ok(main)
}
