//! Host services reachable from capability functions.
//!
//! Capability functions never own business logic; they convert arguments and
//! delegate to the collaborators registered on the [`HostContext`]. The context
//! is shared by every interpreter instance and stored as Lua app data.

use crate::config::AppConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::memory::{MemoryCache, MemoryStore};
use chrono::NaiveDate;
use mlua::Lua;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use uuid::Uuid;

/// A database row keyed by column name.
pub type Row = serde_json::Map<String, JsonValue>;

/// Result of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// SQL access for the `db` module.
pub trait Database: Send + Sync {
    /// Run a query and return all rows.
    fn query(&self, sql: &str, args: &[JsonValue]) -> RuntimeResult<Vec<Row>>;

    /// Run a statement.
    fn execute(&self, sql: &str, args: &[JsonValue]) -> RuntimeResult<ExecResult>;
}

/// Page and widget rendering.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, data: &JsonValue) -> RuntimeResult<String>;

    fn render_widget(&self, widget: &str, data: &JsonValue) -> RuntimeResult<String>;
}

/// An outbound mail message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &Mail) -> RuntimeResult<()>;
}

/// Payment provider operations.
pub trait PaymentGateway: Send + Sync {
    /// Create a payment and return the provider's payment record.
    fn create_payment(&self, payment: &JsonValue) -> RuntimeResult<JsonValue>;

    fn payment_information(&self, payment_id: &str) -> RuntimeResult<JsonValue>;

    fn execute_payment(&self, payment_id: &str, payer_id: &str) -> RuntimeResult<JsonValue>;
}

pub trait CaptchaVerifier: Send + Sync {
    /// Check a captcha response with the provider.
    fn verify(
        &self,
        secret: &str,
        response: &str,
        remote_addr: Option<&str>,
    ) -> RuntimeResult<bool>;
}

/// A text element drawn on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub size: f64,
    pub color: String,
}

/// Description of an image built by a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub background: Option<PathBuf>,
    pub texts: Vec<TextSpec>,
}

pub trait ImageRenderer: Send + Sync {
    /// Rasterize `image` and write it to `path`.
    fn save(&self, image: &ImageSpec, path: &Path) -> RuntimeResult<()>;
}

/// How a script identifies a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerKey {
    Id(i64),
    Name(String),
}

/// A player record as stored by the game server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: i64,
    pub name: String,
    pub account_id: i64,
    pub level: i64,
    pub vocation: i64,
    pub town_id: i64,
    pub sex: i64,
    pub balance: i64,
    pub premium_days: i64,
}

/// Player persistence.
pub trait PlayerStore: Send + Sync {
    fn find(&self, key: &PlayerKey) -> RuntimeResult<Option<PlayerRecord>>;

    fn is_online(&self, player_id: i64) -> RuntimeResult<bool>;

    fn storage_value(&self, player_id: i64, key: i64) -> RuntimeResult<Option<i64>>;

    fn set_storage_value(&self, player_id: i64, key: i64, value: i64) -> RuntimeResult<()>;
}

/// Repeating script jobs.
pub trait EventScheduler: Send + Sync {
    /// Run `script` every `interval` until cancelled.
    fn schedule(&self, interval: Duration, script: PathBuf) -> RuntimeResult<Uuid>;

    /// Cancel a job. Returns false if it was not active.
    fn cancel(&self, id: Uuid) -> bool;
}

/// Short-lived shared values for the `cache` module.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<JsonValue>;

    fn set(&self, key: &str, value: JsonValue, ttl: Option<Duration>);

    fn delete(&self, key: &str) -> bool;
}

/// Persistent key/value storage for the `storage` module.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> RuntimeResult<Option<JsonValue>>;

    fn set(&self, key: &str, value: JsonValue) -> RuntimeResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Town {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: i64,
    pub name: String,
    pub town_id: i64,
    pub size: i64,
    pub rent: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocation {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Game world data loaded by the host from the server's datapack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub towns: Vec<Town>,
    pub houses: Vec<House>,
    pub vocations: Vec<Vocation>,
}

impl GameData {
    pub fn town_by_id(&self, id: i64) -> Option<&Town> {
        self.towns.iter().find(|t| t.id == id)
    }

    pub fn town_by_name(&self, name: &str) -> Option<&Town> {
        self.towns.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn vocation_by_id(&self, id: i64) -> Option<&Vocation> {
        self.vocations.iter().find(|v| v.id == id)
    }

    pub fn vocation_by_name(&self, name: &str) -> Option<&Vocation> {
        self.vocations
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// Everything capability functions may reach on the host side.
pub struct HostContext {
    config: AppConfig,
    data: GameData,
    last_log_rotation: NaiveDate,
    cache: Arc<dyn Cache>,
    storage: Arc<dyn KeyValueStore>,
    database: Option<Arc<dyn Database>>,
    templates: Option<Arc<dyn TemplateRenderer>>,
    mailer: Option<Arc<dyn Mailer>>,
    payments: Option<Arc<dyn PaymentGateway>>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    images: Option<Arc<dyn ImageRenderer>>,
    players: Option<Arc<dyn PlayerStore>>,
    events: OnceLock<Arc<dyn EventScheduler>>,
}

impl HostContext {
    /// Create a context with in-memory cache and storage and no other services.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            data: GameData::default(),
            last_log_rotation: chrono::Local::now().date_naive(),
            cache: Arc::new(MemoryCache::new()),
            storage: Arc::new(MemoryStore::new()),
            database: None,
            templates: None,
            mailer: None,
            payments: None,
            captcha: None,
            images: None,
            players: None,
            events: OnceLock::new(),
        }
    }

    pub fn with_game_data(mut self, data: GameData) -> Self {
        self.data = data;
        self
    }

    /// Set the date of the last log rotation, used for the `logFile` global.
    pub fn with_last_log_rotation(mut self, date: NaiveDate) -> Self {
        self.last_log_rotation = date;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateRenderer>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_payments(mut self, payments: Arc<dyn PaymentGateway>) -> Self {
        self.payments = Some(payments);
        self
    }

    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = Some(captcha);
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageRenderer>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_players(mut self, players: Arc<dyn PlayerStore>) -> Self {
        self.players = Some(players);
        self
    }

    /// Attach the event scheduler. The scheduler needs the pool, which is built
    /// after the context, so it is attached once later. Returns false if a
    /// scheduler was already attached.
    pub fn attach_scheduler(&self, scheduler: Arc<dyn EventScheduler>) -> bool {
        self.events.set(scheduler).is_ok()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn game_data(&self) -> &GameData {
        &self.data
    }

    pub fn last_log_rotation(&self) -> NaiveDate {
        self.last_log_rotation
    }

    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn database(&self) -> RuntimeResult<&dyn Database> {
        required(&self.database, "database")
    }

    pub fn templates(&self) -> RuntimeResult<&dyn TemplateRenderer> {
        required(&self.templates, "template")
    }

    pub fn mailer(&self) -> RuntimeResult<&dyn Mailer> {
        required(&self.mailer, "mail")
    }

    pub fn payments(&self) -> RuntimeResult<&dyn PaymentGateway> {
        required(&self.payments, "payment")
    }

    pub fn captcha(&self) -> RuntimeResult<&dyn CaptchaVerifier> {
        required(&self.captcha, "captcha")
    }

    pub fn images(&self) -> RuntimeResult<&dyn ImageRenderer> {
        required(&self.images, "image")
    }

    pub fn players(&self) -> RuntimeResult<&dyn PlayerStore> {
        required(&self.players, "player")
    }

    pub fn events(&self) -> RuntimeResult<&dyn EventScheduler> {
        self.events
            .get()
            .map(|s| &**s)
            .ok_or(RuntimeError::ServiceUnavailable("event"))
    }
}

fn required<'a, T: ?Sized>(
    service: &'a Option<Arc<T>>,
    name: &'static str,
) -> RuntimeResult<&'a T> {
    service
        .as_deref()
        .ok_or(RuntimeError::ServiceUnavailable(name))
}

/// The host context of the instance running `lua`.
pub fn host(lua: &Lua) -> mlua::Result<Arc<HostContext>> {
    lua.app_data_ref::<Arc<HostContext>>()
        .map(|ctx| Arc::clone(&ctx))
        .ok_or_else(|| mlua::Error::runtime("instance has no host context"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_services_report_their_name() {
        let ctx = HostContext::new(AppConfig::default());
        let err = ctx.database().err().unwrap();
        assert_eq!(err.to_string(), "database service is not configured");
        assert!(ctx.mailer().is_err());
        assert!(ctx.events().is_err());
    }

    #[test]
    fn test_game_data_lookups() {
        let data = GameData {
            towns: vec![Town { id: 1, name: "Thais".into() }],
            houses: vec![],
            vocations: vec![Vocation {
                id: 4,
                name: "Knight".into(),
                description: "a knight".into(),
            }],
        };
        assert_eq!(data.town_by_name("thais").unwrap().id, 1);
        assert!(data.town_by_id(2).is_none());
        assert_eq!(data.vocation_by_id(4).unwrap().name, "Knight");
        assert!(data.vocation_by_name("Druid").is_none());
    }

    #[test]
    fn test_host_lookup() {
        let lua = Lua::new();
        assert!(host(&lua).is_err());

        lua.set_app_data(Arc::new(HostContext::new(AppConfig::default())));
        assert_eq!(host(&lua).unwrap().config().port, 8080);
    }
}
