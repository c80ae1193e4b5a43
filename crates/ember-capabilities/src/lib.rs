//! # ember-capabilities
//!
//! The capability modules ember scripts can call.
//!
//! Every function here is a thin adapter: it converts script arguments into
//! host types, delegates to the request [`Exchange`](ember_runtime::Exchange)
//! or a service on the [`HostContext`](ember_runtime::HostContext), and
//! converts the result back. Business logic lives behind those services.
//!
//! ## Modules
//!
//! | Global      | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `crypto`    | hashing, random tokens, TOTP secrets and URIs  |
//! | `db`        | SQL queries through the database service       |
//! | `config`    | configuration lookups                          |
//! | `http`      | request data and response building             |
//! | `validator` | input validation                               |
//! | `session`   | session data and flash messages                |
//! | `captcha`   | captcha verification                           |
//! | `map`       | towns and houses                               |
//! | `xml`       | vocations and XML conversion                   |
//! | `mail`      | outbound mail                                  |
//! | `cache`     | short-lived shared values                      |
//! | `debug`     | value inspection                               |
//! | `url`       | form encoding                                  |
//! | `time`      | timestamps and durations                       |
//! | `reflect`   | reserved                                       |
//! | `json`      | JSON conversion                                |
//! | `storage`   | persistent key/value data                      |
//! | `widget`    | widget rendering                               |
//! | `events`    | repeating script events                        |
//! | `paypal`    | payments                                       |
//! | `img`       | image creation                                 |
//! | `file`      | file metadata                                  |
//! | `env`       | process environment                            |
//!
//! Object types: `event`, `image` and `player` (built by the `Player` global).

pub mod modules;
mod otp;
mod registry;

pub use registry::{build_registry, registry, NAMESPACES, OBJECT_TYPES};

#[cfg(test)]
pub(crate) mod testing {
    use ember_runtime::{
        CapabilityBinder, CapabilityModule, CapabilityRegistry, Exchange, HostContext, Request,
        Response,
    };
    use mlua::Lua;
    use std::sync::Arc;

    /// A Lua state with `registry` bound and `host` attached.
    pub fn lua_with(registry: CapabilityRegistry, host: HostContext) -> Lua {
        let lua = Lua::new();
        lua.set_app_data(Arc::new(host));
        CapabilityBinder::new(&lua).bind_registry(&registry).unwrap();
        lua
    }

    /// A Lua state with a single module bound.
    pub fn lua_for(module: CapabilityModule, host: HostContext) -> Lua {
        lua_with(CapabilityRegistry::new().register(module), host)
    }

    /// Start a request on `lua`.
    pub fn begin(lua: &Lua, request: Request) {
        lua.set_app_data(Exchange::new(request));
    }

    /// Finish the current request and return its response.
    pub fn finish(lua: &Lua) -> Response {
        lua.remove_app_data::<Exchange>().unwrap().into_response()
    }
}
