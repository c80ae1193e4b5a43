//! The process-wide capability registry.

use crate::modules::{
    cache, captcha, config, crypto, db, debug, env, events, file, http, image, json, mail, map,
    paypal, player, reflect, session, storage, time, url, validator, widget, xml,
};
use ember_runtime::CapabilityRegistry;
use std::sync::{Arc, OnceLock};

/// Global tables every configured instance exposes.
pub const NAMESPACES: &[&str] = &[
    "crypto", "db", "config", "http", "validator", "session", "captcha", "map", "xml", "mail",
    "cache", "debug", "url", "time", "reflect", "json", "storage", "widget", "events", "paypal",
    "img", "file", "env",
];

/// Object types every configured instance exposes.
pub const OBJECT_TYPES: &[&str] = &["event", "image", "player"];

static REGISTRY: OnceLock<Arc<CapabilityRegistry>> = OnceLock::new();

/// The shared registry, built on first use.
pub fn registry() -> Arc<CapabilityRegistry> {
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(build_registry())))
}

/// Build a fresh registry with every capability module.
pub fn build_registry() -> CapabilityRegistry {
    CapabilityRegistry::new()
        .register(crypto::module())
        .register(db::module())
        .register(config::module())
        .register(http::module())
        .register(validator::module())
        .register(session::module())
        .register(captcha::module())
        .register(map::module())
        .register(xml::module())
        .register(mail::module())
        .register(cache::module())
        .register(debug::module())
        .register(url::module())
        .register(time::module())
        .register(reflect::module())
        .register(json::module())
        .register(storage::module())
        .register(widget::module())
        .register(events::module())
        .register(events::event_type())
        .register(paypal::module())
        .register(image::module())
        .register(image::image_type())
        .register(file::module())
        .register(env::module())
        .register(player::player_type())
        .register_factory(player::factory())
}
