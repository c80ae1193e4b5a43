//! `map`: towns and houses of the game world.

use ember_runtime::convert::to_lua;
use ember_runtime::{host, CapabilityModule};

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("map")
        .function("houseList", |lua, town_id: Option<i64>| {
            let host = host(lua)?;
            let houses: Vec<_> = host
                .game_data()
                .houses
                .iter()
                .filter(|house| town_id.map_or(true, |id| house.town_id == id))
                .collect();
            to_lua(lua, &houses)
        })
        .function("townList", |lua, ()| {
            to_lua(lua, &host(lua)?.game_data().towns)
        })
        .function("townByID", |lua, id: i64| {
            to_lua(lua, &host(lua)?.game_data().town_by_id(id))
        })
        .function("townByName", |lua, name: String| {
            to_lua(lua, &host(lua)?.game_data().town_by_name(&name))
        })
}
