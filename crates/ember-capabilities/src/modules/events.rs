//! `events`: repeating script events, and the `event` object type.
//!
//! ```lua
//! local ev = events:add(60, "engine/events/highscores.lua")
//! ev:stop()
//! ```

use ember_runtime::{host, new_object, object_state, CapabilityModule};
use mlua::{Table, UserData};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Object type name of scheduled events.
pub const EVENT_TYPE: &str = "event";

/// Host state of an `event` object.
pub struct EventHandle {
    id: Uuid,
}

impl EventHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl UserData for EventHandle {}

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("events").function(
        "add",
        |lua, (seconds, script): (f64, String)| {
            let interval = Duration::try_from_secs_f64(seconds)
                .map_err(|_| mlua::Error::runtime("events: invalid interval"))?;
            let id = host(lua)?
                .events()?
                .schedule(interval, PathBuf::from(script))?;
            new_object(lua, EVENT_TYPE, EventHandle { id })
        },
    )
}

pub fn event_type() -> CapabilityModule {
    CapabilityModule::object_type(EVENT_TYPE).function("stop", |lua, this: Table| {
        let id = object_state::<EventHandle>(&this)?.id();
        Ok(host(lua)?.events()?.cancel(id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_with;
    use ember_runtime::services::EventScheduler;
    use ember_runtime::{AppConfig, CapabilityRegistry, HostContext, RuntimeResult};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeScheduler {
        jobs: Mutex<HashMap<Uuid, (Duration, PathBuf)>>,
    }

    impl EventScheduler for FakeScheduler {
        fn schedule(&self, interval: Duration, script: PathBuf) -> RuntimeResult<Uuid> {
            let id = Uuid::new_v4();
            self.jobs.lock().unwrap().insert(id, (interval, script));
            Ok(id)
        }

        fn cancel(&self, id: Uuid) -> bool {
            self.jobs.lock().unwrap().remove(&id).is_some()
        }
    }

    fn lua(scheduler: Option<Arc<FakeScheduler>>) -> mlua::Lua {
        let host = HostContext::new(AppConfig::default());
        if let Some(scheduler) = scheduler {
            assert!(host.attach_scheduler(scheduler));
        }
        lua_with(
            CapabilityRegistry::new()
                .register(module())
                .register(event_type()),
            host,
        )
    }

    #[test]
    fn test_add_and_stop() {
        let scheduler = Arc::new(FakeScheduler::default());
        let lua = lua(Some(scheduler.clone()));

        let (first, second): (bool, bool) = lua
            .load(
                r#"
                local ev = events:add(1.5, "engine/tick.lua")
                return ev:stop(), ev:stop()
                "#,
            )
            .eval()
            .unwrap();
        assert!(first);
        assert!(!second);
        assert!(scheduler.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_add_passes_interval_and_script() {
        let scheduler = Arc::new(FakeScheduler::default());
        let lua = lua(Some(scheduler.clone()));
        lua.load(r#"events:add(30, "engine/save.lua")"#).exec().unwrap();

        let jobs = scheduler.jobs.lock().unwrap();
        let (interval, script) = jobs.values().next().unwrap();
        assert_eq!(*interval, Duration::from_secs(30));
        assert_eq!(script, &PathBuf::from("engine/save.lua"));
    }

    #[test]
    fn test_without_scheduler() {
        let err = lua(None)
            .load(r#"events:add(1, "x.lua")"#)
            .exec()
            .unwrap_err();
        assert!(err.to_string().contains("event service is not configured"));
    }

    #[test]
    fn test_negative_interval() {
        let scheduler = Arc::new(FakeScheduler::default());
        assert!(lua(Some(scheduler))
            .load(r#"events:add(-1, "x.lua")"#)
            .exec()
            .is_err());
    }
}
