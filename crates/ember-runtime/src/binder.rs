//! Injection of capability modules into an interpreter instance.
//!
//! Namespace modules become global tables. Object-type modules become class
//! tables stored in the Lua registry (see [`crate::capability::class_key`]);
//! factories such as `Player` look them up when creating objects.
//!
//! Binding never overwrites: a name that is already taken is a configuration
//! defect and fails the whole configuration.

use crate::capability::{
    class_key, Binding, CapabilityModule, CapabilityRegistry, Exposure, GlobalFactory,
};
use crate::error::{RuntimeError, RuntimeResult};
use mlua::{Function, Lua, MultiValue, Table, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Binds capability modules into one Lua state.
pub struct CapabilityBinder<'lua> {
    lua: &'lua Lua,
    bound: BTreeSet<&'static str>,
}

impl<'lua> CapabilityBinder<'lua> {
    pub fn new(lua: &'lua Lua) -> Self {
        Self {
            lua,
            bound: BTreeSet::new(),
        }
    }

    /// Bind every module and factory of `registry`, then check that all of
    /// them are actually present.
    pub fn bind_registry(&mut self, registry: &CapabilityRegistry) -> RuntimeResult<()> {
        for module in registry.modules() {
            self.bind(module)?;
        }
        for factory in registry.factories() {
            self.bind_factory(factory)?;
        }
        self.verify(registry)?;

        debug!(
            modules = registry.len(),
            factories = registry.factories().len(),
            "Bound capability registry"
        );
        Ok(())
    }

    /// Bind a single module.
    pub fn bind(&mut self, module: &CapabilityModule) -> RuntimeResult<()> {
        if self.bound.contains(module.name()) {
            return Err(RuntimeError::BindingCollision(module.name().to_string()));
        }

        let methods = self.method_table(module)?;
        match module.exposure() {
            Exposure::Namespace => {
                let globals = self.lua.globals();
                if globals.contains_key(module.name())? {
                    return Err(RuntimeError::BindingCollision(module.name().to_string()));
                }
                globals.set(module.name(), methods)?;
            }
            Exposure::ObjectType => {
                let key = class_key(module.name());
                let existing: Value = self.lua.named_registry_value(&key)?;
                if !existing.is_nil() {
                    return Err(RuntimeError::BindingCollision(key));
                }
                methods.set("__index", methods.clone())?;
                methods.set("__name", module.name())?;
                self.lua.set_named_registry_value(&key, methods)?;
            }
        }

        self.bound.insert(module.name());
        Ok(())
    }

    /// Bind a factory function as a global.
    pub fn bind_factory(&mut self, factory: &GlobalFactory) -> RuntimeResult<()> {
        let globals = self.lua.globals();
        if globals.contains_key(factory.name())? {
            return Err(RuntimeError::BindingCollision(factory.name().to_string()));
        }

        let function = factory.function().clone();
        let function = self
            .lua
            .create_function(move |lua, args: MultiValue| function.call(lua, args))?;
        globals.set(factory.name(), function)?;
        Ok(())
    }

    /// Check that every module of `registry` is reachable with all its methods.
    pub fn verify(&self, registry: &CapabilityRegistry) -> RuntimeResult<()> {
        for module in registry.modules() {
            let table: Option<Table> = match module.exposure() {
                Exposure::Namespace => self.lua.globals().get(module.name())?,
                Exposure::ObjectType => self.lua.named_registry_value(&class_key(module.name()))?,
            };
            let Some(table) = table else {
                return Err(RuntimeError::UnboundModule(module.name().to_string()));
            };
            for (method, _) in module.methods() {
                if table.get::<Option<Function>>(method)?.is_none() {
                    return Err(RuntimeError::UnboundModule(format!(
                        "{}.{}",
                        module.name(),
                        method
                    )));
                }
            }
        }

        for factory in registry.factories() {
            if self.lua.globals().get::<Option<Function>>(factory.name())?.is_none() {
                return Err(RuntimeError::UnboundModule(factory.name().to_string()));
            }
        }
        Ok(())
    }

    fn method_table(&self, module: &CapabilityModule) -> RuntimeResult<Table> {
        let table = self.lua.create_table()?;
        for (method, binding) in module.methods() {
            let function = match binding {
                Binding::Native(host_fn) => {
                    let host_fn = host_fn.clone();
                    match module.exposure() {
                        Exposure::Namespace => {
                            let namespace = module.name();
                            self.lua.create_function(move |lua, args: MultiValue| {
                                host_fn.call(lua, strip_namespace(lua, namespace, args)?)
                            })?
                        }
                        Exposure::ObjectType => self
                            .lua
                            .create_function(move |lua, args: MultiValue| host_fn.call(lua, args))?,
                    }
                }
                Binding::Reserved => {
                    let qualified = format!("{}.{}", module.name(), method);
                    self.lua.create_function(move |_, _: MultiValue| -> mlua::Result<()> {
                        Err(mlua::Error::runtime(format!("{qualified} is not implemented")))
                    })?
                }
            };
            table.set(method, function)?;
        }
        Ok(table)
    }
}

/// Drop the namespace table when a function is called with method syntax,
/// so `crypto:sha1(x)` and `crypto.sha1(x)` behave the same.
fn strip_namespace(lua: &Lua, namespace: &str, mut args: MultiValue) -> mlua::Result<MultiValue> {
    if let Some(Value::Table(first)) = args.front() {
        if let Value::Table(table) = lua.globals().raw_get::<Value>(namespace)? {
            if &table == first {
                args.pop_front();
            }
        }
    }
    Ok(args)
}
