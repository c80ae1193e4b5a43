//! `http`: request data and response building for the current request.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{host, with_exchange, CapabilityModule};
use mlua::Value;
use std::path::PathBuf;

const DEFAULT_REDIRECT_STATUS: u16 = 302;
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("http")
        .function(
            "redirect",
            |lua, (location, status): (String, Option<u16>)| {
                with_exchange(lua, |ex| {
                    ex.response.status = status.unwrap_or(DEFAULT_REDIRECT_STATUS);
                    ex.response.redirect = Some(location);
                })
            },
        )
        .function("render", |lua, (template, data): (String, Value)| {
            let data = to_json(lua, data)?;
            let page = host(lua)?.templates()?.render(&template, &data)?;
            with_exchange(lua, |ex| {
                ex.response
                    .headers
                    .entry("Content-Type".to_string())
                    .or_insert_with(|| HTML_CONTENT_TYPE.to_string());
                ex.response.body.extend_from_slice(page.as_bytes());
            })
        })
        .function("write", |lua, text: mlua::String| {
            with_exchange(lua, |ex| ex.response.body.extend_from_slice(&text.as_bytes()))
        })
        .function("serveFile", |lua, path: String| {
            with_exchange(lua, |ex| ex.response.file = Some(PathBuf::from(path)))
        })
        .function("get", |lua, key: Option<String>| {
            let query = with_exchange(lua, |ex| ex.request.query.clone())?;
            match key {
                Some(key) => to_lua(lua, &query.get(&key)),
                None => to_lua(lua, &query),
            }
        })
        .function("postForm", |lua, key: Option<String>| {
            let form = with_exchange(lua, |ex| ex.request.form.clone())?;
            match key {
                Some(key) => to_lua(lua, &form.get(&key)),
                None => to_lua(lua, &form),
            }
        })
        .function("setHeader", |lua, (name, value): (String, String)| {
            with_exchange(lua, |ex| {
                ex.response.headers.insert(name, value);
            })
        })
        .function("getHeader", |lua, name: String| {
            with_exchange(lua, |ex| ex.request.header(&name).map(str::to_string))
        })
        .function("getRemoteAddress", |lua, ()| {
            with_exchange(lua, |ex| ex.request.remote_addr.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{begin, finish, lua_for};
    use ember_runtime::services::TemplateRenderer;
    use ember_runtime::{AppConfig, HostContext, Request, RuntimeResult};
    use serde_json::Value as JsonValue;
    use std::sync::Arc;

    struct EchoTemplates;

    impl TemplateRenderer for EchoTemplates {
        fn render(&self, template: &str, data: &JsonValue) -> RuntimeResult<String> {
            Ok(format!("<{template}>{}", data["title"].as_str().unwrap_or("")))
        }

        fn render_widget(&self, widget: &str, _data: &JsonValue) -> RuntimeResult<String> {
            Ok(widget.to_string())
        }
    }

    fn lua() -> mlua::Lua {
        lua_for(
            module(),
            HostContext::new(AppConfig::default()).with_templates(Arc::new(EchoTemplates)),
        )
    }

    #[test]
    fn test_write_and_headers() {
        let lua = lua();
        begin(&lua, Request::get("/").with_header("Accept-Language", "en"));
        lua.load(
            r#"
            http:write("lang=" .. http:getHeader("accept-language"))
            http:setHeader("X-Frame-Options", "DENY")
            "#,
        )
        .exec()
        .unwrap();

        let response = finish(&lua);
        assert_eq!(response.body_text(), "lang=en");
        assert_eq!(response.headers["X-Frame-Options"], "DENY");
    }

    #[test]
    fn test_write_binary_body() {
        let lua = lua();
        begin(&lua, Request::get("/banner.png"));
        lua.load(r#"http:write("\137PNG\255\0") http:write("end")"#)
            .exec()
            .unwrap();

        let response = finish(&lua);
        assert_eq!(response.body, b"\x89PNG\xff\0end");
    }

    #[test]
    fn test_redirect() {
        let lua = lua();
        begin(&lua, Request::post("/login"));
        lua.load(r#"http:redirect("/account")"#).exec().unwrap();

        let response = finish(&lua);
        assert_eq!(response.status, 302);
        assert_eq!(response.redirect.as_deref(), Some("/account"));
    }

    #[test]
    fn test_render_sets_content_type() {
        let lua = lua();
        begin(&lua, Request::get("/"));
        lua.load(r#"http:render("home.html", {title = "News"})"#)
            .exec()
            .unwrap();

        let response = finish(&lua);
        assert_eq!(response.body_text(), "<home.html>News");
        assert_eq!(response.headers["Content-Type"], HTML_CONTENT_TYPE);
    }

    #[test]
    fn test_query_form_and_address() {
        let lua = lua();
        begin(
            &lua,
            Request::post("/search")
                .with_query("page", "2")
                .with_form("name", "Alice")
                .with_remote_addr("10.0.0.1"),
        );
        let ok: bool = lua
            .load(
                r#"
                return http:get("page") == "2"
                    and http:get("missing") == nil
                    and http:get().page == "2"
                    and http:postForm("name") == "Alice"
                    and http:getRemoteAddress() == "10.0.0.1"
                "#,
            )
            .eval()
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_serve_file() {
        let lua = lua();
        begin(&lua, Request::get("/download"));
        lua.load(r#"http:serveFile("public/client.zip")"#).exec().unwrap();
        assert_eq!(
            finish(&lua).file,
            Some(PathBuf::from("public/client.zip"))
        );
    }

    #[test]
    fn test_requires_active_request() {
        let err = lua().load(r#"http:write("x")"#).exec().unwrap_err();
        assert!(err.to_string().contains("No active request"));
    }
}
