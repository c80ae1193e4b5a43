//! One submodule per script-visible capability module.

pub mod cache;
pub mod captcha;
pub mod config;
pub mod crypto;
pub mod db;
pub mod debug;
pub mod env;
pub mod events;
pub mod file;
pub mod http;
pub mod image;
pub mod json;
pub mod mail;
pub mod map;
pub mod paypal;
pub mod player;
pub mod reflect;
pub mod session;
pub mod storage;
pub mod time;
pub mod url;
pub mod validator;
pub mod widget;
pub mod xml;
