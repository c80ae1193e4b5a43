//! Capability modules and the registry that holds them.
//!
//! A capability module is a named group of host functions exposed to scripts,
//! either as a plain global table (`crypto.sha1(...)`) or as an object type
//! whose instances are built by a factory and called with method syntax
//! (`player:getLevel()`). Modules are assembled once at start-up and never
//! mutated afterwards; the registry only stores function identity.

use mlua::{
    FromLuaMulti, IntoLuaMulti, Lua, MultiValue, Table, UserData, UserDataRef, UserDataRefMut,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type Callback = dyn Fn(&Lua, MultiValue) -> mlua::Result<MultiValue> + Send + Sync;

/// Field on an object table that holds its host-side state.
const HANDLE_FIELD: &str = "__handle";

/// A host-implemented function callable from scripts.
///
/// Arguments arrive already converted to host types; a returned `Err` is
/// raised in the calling script as a Lua runtime error.
#[derive(Clone)]
pub struct HostFunction {
    callback: Arc<Callback>,
}

impl HostFunction {
    /// Wrap a typed host function.
    pub fn new<A, R, F>(func: F) -> Self
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(move |lua: &Lua, args: MultiValue| {
                let args = A::from_lua_multi(args, lua)?;
                func(lua, args)?.into_lua_multi(lua)
            }),
        }
    }

    /// Invoke the function with raw script arguments.
    pub fn call(&self, lua: &Lua, args: MultiValue) -> mlua::Result<MultiValue> {
        (self.callback)(lua, args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFunction")
    }
}

/// One entry of a capability module.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A wired host function.
    Native(HostFunction),

    /// A name reserved for a capability that is not wired yet.
    /// Calling it raises a "not implemented" error.
    Reserved,
}

impl Binding {
    /// Check if this binding is a reserved placeholder.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Binding::Reserved)
    }
}

/// How a module is presented to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// A global table named after the module.
    Namespace,

    /// A class table kept in the Lua registry; instances are created by
    /// factories and use it as their metatable.
    ObjectType,
}

/// A named, immutable group of host functions.
#[derive(Debug, Clone)]
pub struct CapabilityModule {
    name: &'static str,
    exposure: Exposure,
    methods: BTreeMap<&'static str, Binding>,
}

impl CapabilityModule {
    /// Start a module exposed as a global table.
    pub fn namespace(name: &'static str) -> Self {
        Self {
            name,
            exposure: Exposure::Namespace,
            methods: BTreeMap::new(),
        }
    }

    /// Start a module exposed as an object type.
    pub fn object_type(name: &'static str) -> Self {
        Self {
            name,
            exposure: Exposure::ObjectType,
            methods: BTreeMap::new(),
        }
    }

    /// Add a host function under `method`.
    pub fn function<A, R, F>(mut self, method: &'static str, func: F) -> Self
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + Send + Sync + 'static,
    {
        self.methods
            .insert(method, Binding::Native(HostFunction::new(func)));
        self
    }

    /// Reserve `method` without wiring it.
    pub fn reserved(mut self, method: &'static str) -> Self {
        self.methods.insert(method, Binding::Reserved);
        self
    }

    /// Module name, used as the global (or class) name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How the module is exposed.
    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    /// All bindings, ordered by method name.
    pub fn methods(&self) -> impl Iterator<Item = (&'static str, &Binding)> {
        self.methods.iter().map(|(name, binding)| (*name, binding))
    }

    /// Look up one binding.
    pub fn method(&self, name: &str) -> Option<&Binding> {
        self.methods.get(name)
    }

    /// Number of bindings in the module.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check if the module has no bindings.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A host function bound directly as a global, such as the `Player` constructor.
#[derive(Debug, Clone)]
pub struct GlobalFactory {
    name: &'static str,
    function: HostFunction,
}

impl GlobalFactory {
    /// Create a factory global.
    pub fn new<A, R, F>(name: &'static str, func: F) -> Self
    where
        A: FromLuaMulti,
        R: IntoLuaMulti,
        F: Fn(&Lua, A) -> mlua::Result<R> + Send + Sync + 'static,
    {
        Self {
            name,
            function: HostFunction::new(func),
        }
    }

    /// Global name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The wrapped function.
    pub fn function(&self) -> &HostFunction {
        &self.function
    }
}

/// The process-wide table of capability modules.
///
/// Built once at start-up and shared read-only by every interpreter instance.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    modules: Vec<CapabilityModule>,
    factories: Vec<GlobalFactory>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Duplicate names are rejected later, when the binder
    /// finds the name already taken.
    pub fn register(mut self, module: CapabilityModule) -> Self {
        self.modules.push(module);
        self
    }

    /// Add a factory global.
    pub fn register_factory(mut self, factory: GlobalFactory) -> Self {
        self.factories.push(factory);
        self
    }

    /// All registered modules.
    pub fn modules(&self) -> &[CapabilityModule] {
        &self.modules
    }

    /// All factory globals.
    pub fn factories(&self) -> &[GlobalFactory] {
        &self.factories
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Option<&CapabilityModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Lua registry key under which an object type's class table is stored.
pub fn class_key(class: &str) -> String {
    format!("ember.class.{class}")
}

/// Create a script object of the given object type carrying `state`.
pub fn new_object<T>(lua: &Lua, class: &str, state: T) -> mlua::Result<Table>
where
    T: UserData + Send + 'static,
{
    let metatable: Table = lua.named_registry_value(&class_key(class))?;
    let object = lua.create_table()?;
    object.raw_set(HANDLE_FIELD, lua.create_userdata(state)?)?;
    object.set_metatable(Some(metatable));
    Ok(object)
}

/// Borrow the host state of a script object.
pub fn object_state<T: UserData + 'static>(object: &Table) -> mlua::Result<UserDataRef<T>> {
    let handle: mlua::AnyUserData = object.raw_get(HANDLE_FIELD)?;
    handle.borrow::<T>()
}

/// Mutably borrow the host state of a script object.
pub fn object_state_mut<T: UserData + 'static>(object: &Table) -> mlua::Result<UserDataRefMut<T>> {
    let handle: mlua::AnyUserData = object.raw_get(HANDLE_FIELD)?;
    handle.borrow_mut::<T>()
}
