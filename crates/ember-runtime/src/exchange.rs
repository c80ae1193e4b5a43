//! Per-invocation request and response state.
//!
//! The invocation boundary hands a [`Request`] to an instance when it runs a
//! script and receives a [`Response`] back. While the script runs, the pair
//! lives on the instance as an [`Exchange`]; it is removed again on every exit
//! path so a reused instance never sees a previous caller's request.

use crate::error::RuntimeError;
use mlua::Lua;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Session keys with a fixed meaning.
pub const SESSION_LOGGED: &str = "logged";
pub const SESSION_ADMIN: &str = "admin";
pub const SESSION_ACCOUNT: &str = "account";

/// Session data carried by a request and returned with the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    values: BTreeMap<String, JsonValue>,
    flash: BTreeMap<String, String>,
    destroyed: bool,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session value.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Set a session value. Setting `null` removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        let key = key.into();
        if value.is_null() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, value);
        }
    }

    /// Store a flash message, readable once.
    pub fn set_flash(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.flash.insert(key.into(), message.into());
    }

    /// Read and consume a flash message.
    pub fn take_flash(&mut self, key: &str) -> Option<String> {
        self.flash.remove(key)
    }

    /// Drop all session data and mark the session for deletion.
    pub fn destroy(&mut self) {
        self.values.clear();
        self.flash.clear();
        self.destroyed = true;
    }

    /// Check if the session was destroyed during the request.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Check if an account is logged in.
    pub fn is_logged(&self) -> bool {
        self.flag(SESSION_LOGGED)
    }

    /// Check if the logged account has admin rights.
    pub fn is_admin(&self) -> bool {
        self.is_logged() && self.flag(SESSION_ADMIN)
    }

    /// The logged account record, if any.
    pub fn account(&self) -> Option<&JsonValue> {
        if self.is_logged() {
            self.values.get(SESSION_ACCOUNT)
        } else {
            None
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

/// An incoming request as seen by scripts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub form: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub remote_addr: Option<String>,
    #[serde(default)]
    pub session: Session,
}

impl Request {
    /// Create a request for `method` and `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Create a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// A request for host-initiated runs such as scheduled events.
    pub fn internal() -> Self {
        Self::new("INTERNAL", "")
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Look up a header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What a script produced for the invocation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes; scripts may write binary data.
    #[serde(with = "body_bytes")]
    pub body: Vec<u8>,
    pub redirect: Option<String>,
    pub file: Option<PathBuf>,
    pub session: Session,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Vec::new(),
            redirect: None,
            file: None,
            session: Session::default(),
        }
    }
}

impl Response {
    /// The body as text, with invalid UTF-8 replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Bodies are written as text when they are valid UTF-8, as a byte array otherwise.
mod body_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Body {
        Text(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(body) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => body.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(match Body::deserialize(deserializer)? {
            Body::Text(text) => text.into_bytes(),
            Body::Bytes(bytes) => bytes,
        })
    }
}

/// Request and response state of the script currently running on an instance.
#[derive(Debug)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
}

impl Exchange {
    /// Start an exchange; the session moves to the response side so changes
    /// made by the script are returned to the caller.
    pub fn new(mut request: Request) -> Self {
        let session = std::mem::take(&mut request.session);
        Self {
            request,
            response: Response {
                session,
                ..Response::default()
            },
        }
    }

    /// The session of this exchange.
    pub fn session(&mut self) -> &mut Session {
        &mut self.response.session
    }

    /// Finish the exchange.
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Run `f` against the exchange of the script currently running on `lua`.
pub fn with_exchange<R>(lua: &Lua, f: impl FnOnce(&mut Exchange) -> R) -> mlua::Result<R> {
    let mut exchange = lua
        .app_data_mut::<Exchange>()
        .ok_or(RuntimeError::NoActiveRequest)?;
    Ok(f(&mut *exchange))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_body_serialization() {
        let mut response = Response {
            body: b"hello".to_vec(),
            ..Response::default()
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["body"], json!("hello"));

        response.body = vec![0x89, b'P', 0xff];
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["body"], json!([0x89, 80, 0xff]));

        let back: Response = serde_json::from_value(value).unwrap();
        assert_eq!(back.body, vec![0x89, b'P', 0xff]);
        assert_eq!(back.body_text(), "\u{fffd}P\u{fffd}");
    }

    #[test]
    fn test_session_flags() {
        let mut session = Session::new();
        assert!(!session.is_logged());
        assert!(!session.is_admin());

        session.set(SESSION_ADMIN, json!(true));
        assert!(!session.is_admin(), "admin requires a logged session");

        session.set(SESSION_LOGGED, json!(true));
        session.set(SESSION_ACCOUNT, json!({"name": "ember"}));
        assert!(session.is_admin());
        assert_eq!(session.account().unwrap()["name"], json!("ember"));
    }

    #[test]
    fn test_flash_is_read_once() {
        let mut session = Session::new();
        session.set_flash("notice", "saved");
        assert_eq!(session.take_flash("notice").as_deref(), Some("saved"));
        assert_eq!(session.take_flash("notice"), None);
    }

    #[test]
    fn test_set_null_removes_key() {
        let mut session = Session::new();
        session.set("k", json!(1));
        session.set("k", JsonValue::Null);
        assert!(session.get("k").is_none());
    }

    #[test]
    fn test_destroy() {
        let mut session = Session::new();
        session.set(SESSION_LOGGED, json!(true));
        session.destroy();
        assert!(session.is_destroyed());
        assert!(!session.is_logged());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = Request::get("/").with_header("User-Agent", "test");
        assert_eq!(request.header("user-agent"), Some("test"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn test_exchange_moves_session_to_response() {
        let mut session = Session::new();
        session.set("k", json!("v"));
        let mut exchange = Exchange::new(Request::get("/").with_session(session));
        exchange.session().set_flash("f", "m");

        let response = exchange.into_response();
        assert_eq!(response.status, 200);
        assert_eq!(response.session.get("k"), Some(&json!("v")));
    }

    #[test]
    fn test_with_exchange_requires_active_request() {
        let lua = Lua::new();
        assert!(with_exchange(&lua, |_| ()).is_err());

        lua.set_app_data(Exchange::new(Request::get("/x")));
        let path = with_exchange(&lua, |ex| ex.request.path.clone()).unwrap();
        assert_eq!(path, "/x");
    }
}
