//! `reflect`: reserved for global lookups, not wired yet.

use ember_runtime::CapabilityModule;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("reflect").reserved("getGlobal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::{AppConfig, HostContext};

    #[test]
    fn test_get_global_is_reserved() {
        let lua = lua_for(module(), HostContext::new(AppConfig::default()));
        let err = lua.load(r#"reflect:getGlobal("app")"#).exec().unwrap_err();
        assert!(err.to_string().contains("reflect.getGlobal is not implemented"));
    }
}
