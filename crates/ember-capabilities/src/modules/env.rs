//! `env`: process environment variables.

use ember_runtime::CapabilityModule;
use std::env;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("env")
        .function("get", |_, name: String| Ok(env::var(&name).ok()))
        .function("set", |_, (name, value): (String, String)| {
            if name.is_empty() || name.contains(['=', '\0']) || value.contains('\0') {
                return Err(mlua::Error::runtime(format!("env: invalid variable {name:?}")));
            }
            env::set_var(name, value);
            Ok(())
        })
}
