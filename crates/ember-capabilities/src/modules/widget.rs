//! `widget`: sidebar widget rendering.

use ember_runtime::convert::to_json;
use ember_runtime::{host, CapabilityModule};
use mlua::Value;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("widget").function(
        "render",
        |lua, (name, data): (String, Value)| {
            let data = to_json(lua, data)?;
            Ok(host(lua)?.templates()?.render_widget(&name, &data)?)
        },
    )
}
