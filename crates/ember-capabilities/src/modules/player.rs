//! The `player` object type and the `Player` constructor.
//!
//! `Player(nameOrId)` loads a player through the host player store and
//! returns `nil` when no such player exists. Record fields are read when the
//! object is built; online status and storage values are always fetched live.

use ember_runtime::convert::to_lua;
use ember_runtime::services::{PlayerKey, PlayerRecord, Town, Vocation};
use ember_runtime::{
    host, new_object, object_state, CapabilityModule, GlobalFactory,
};
use mlua::{Table, UserData, Value};

/// Object type name of players.
pub const PLAYER_TYPE: &str = "player";

/// Global constructor name.
pub const PLAYER_FACTORY: &str = "Player";

/// Host state of a `player` object.
pub struct PlayerState {
    record: PlayerRecord,
}

impl PlayerState {
    pub fn record(&self) -> &PlayerRecord {
        &self.record
    }
}

impl UserData for PlayerState {}

pub fn factory() -> GlobalFactory {
    GlobalFactory::new(PLAYER_FACTORY, |lua, key: Value| {
        let key = match key {
            Value::Integer(id) => PlayerKey::Id(id),
            Value::Number(id) if id.fract() == 0.0 => PlayerKey::Id(id as i64),
            Value::String(name) => PlayerKey::Name(name.to_str()?.to_string()),
            other => {
                return Err(mlua::Error::runtime(format!(
                    "Player: expected a name or an id, got {}",
                    other.type_name()
                )))
            }
        };

        match host(lua)?.players()?.find(&key)? {
            Some(record) => Ok(Value::Table(new_object(
                lua,
                PLAYER_TYPE,
                PlayerState { record },
            )?)),
            None => Ok(Value::Nil),
        }
    })
}

pub fn player_type() -> CapabilityModule {
    CapabilityModule::object_type(PLAYER_TYPE)
        .function("getAccountId", |_, this: Table| Ok(record(&this)?.account_id))
        .function("getName", |_, this: Table| Ok(record(&this)?.name))
        .function("getLevel", |_, this: Table| Ok(record(&this)?.level))
        .function("getSex", |_, this: Table| Ok(record(&this)?.sex))
        .function("getBankBalance", |_, this: Table| Ok(record(&this)?.balance))
        .function("getPremiumDays", |_, this: Table| Ok(record(&this)?.premium_days))
        .function("isOnline", |lua, this: Table| {
            let id = record(&this)?.id;
            Ok(host(lua)?.players()?.is_online(id)?)
        })
        .function("getStorageValue", |lua, (this, key): (Table, i64)| {
            let id = record(&this)?.id;
            Ok(host(lua)?.players()?.storage_value(id, key)?)
        })
        .function(
            "setStorageValue",
            |lua, (this, key, value): (Table, i64, i64)| {
                let id = record(&this)?.id;
                host(lua)?.players()?.set_storage_value(id, key, value)?;
                Ok(())
            },
        )
        .function("getVocation", |lua, this: Table| {
            let id = record(&this)?.vocation;
            let host = host(lua)?;
            let vocation = host
                .game_data()
                .vocation_by_id(id)
                .cloned()
                .unwrap_or_else(|| Vocation {
                    id,
                    ..Vocation::default()
                });
            to_lua(lua, &vocation)
        })
        .function("getTown", |lua, this: Table| {
            let id = record(&this)?.town_id;
            let host = host(lua)?;
            let town = host
                .game_data()
                .town_by_id(id)
                .cloned()
                .unwrap_or_else(|| Town {
                    id,
                    ..Town::default()
                });
            to_lua(lua, &town)
        })
}

fn record(this: &Table) -> mlua::Result<PlayerRecord> {
    Ok(object_state::<PlayerState>(this)?.record.clone())
}
