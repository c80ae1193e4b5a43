//! `url`: form encoding (`application/x-www-form-urlencoded`).

use ember_runtime::CapabilityModule;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("url")
        .function("encode", |_, text: String| Ok(encode(&text)))
        .function("decode", |_, text: String| decode(&text))
}

fn encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

fn decode(text: &str) -> mlua::Result<String> {
    check_escapes(text)?;
    let plus_as_space = text.replace('+', " ");
    percent_decode_str(&plus_as_space)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| mlua::Error::runtime(format!("url: invalid encoding: {e}")))
}

/// Every `%` must start a two-digit hex escape.
fn check_escapes(text: &str) -> mlua::Result<()> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3).unwrap_or(&bytes[i + 1..]);
            if escape.len() != 2 || !escape.iter().all(u8::is_ascii_hexdigit) {
                let shown = String::from_utf8_lossy(escape);
                return Err(mlua::Error::runtime(format!("url: invalid escape \"%{shown}\"")));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::{AppConfig, HostContext};

    #[test]
    fn test_encode_decode() {
        assert_eq!(encode("Sir Bob & co=1"), "Sir+Bob+%26+co%3D1");
        assert_eq!(decode("Sir+Bob+%26+co%3D1").unwrap(), "Sir Bob & co=1");
        assert_eq!(decode("caf%C3%A9").unwrap(), "café");
        assert!(decode("%FF").is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_escapes() {
        for bad in ["%zz", "100%", "a%2", "%%41", "%g1"] {
            let err = decode(bad).unwrap_err();
            assert!(err.to_string().contains("invalid escape"), "{bad}: {err}");
        }
        assert_eq!(decode("100%25").unwrap(), "100%");
        assert_eq!(decode("%2b%2B").unwrap(), "++");
    }

    #[test]
    fn test_decode_error_reaches_script() {
        let lua = lua_for(module(), HostContext::new(AppConfig::default()));
        let err = lua.load(r#"url:decode("%zz")"#).exec().unwrap_err();
        assert!(err.to_string().contains("invalid escape"));
    }

    #[test]
    fn test_from_script() {
        let lua = lua_for(module(), HostContext::new(AppConfig::default()));
        let same: bool = lua
            .load(r#"local s = "a b/c?" return url:decode(url:encode(s)) == s"#)
            .eval()
            .unwrap();
        assert!(same);
    }
}
