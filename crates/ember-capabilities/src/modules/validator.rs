//! `validator`: input validation for forms.
//!
//! `validator.validate(value, rules)` checks a value against a comma-separated
//! rule list and returns `true`, or `false` plus the first failing rule:
//!
//! ```lua
//! local ok, rule = validator:validate(email, "required,email,max=64")
//! ```
//!
//! Supported rules: `required`, `email`, `alpha`, `alphanum`, `numeric`, `url`,
//! `min=N` and `max=N` (length in characters).

use crate::otp;
use ember_runtime::{host, CapabilityModule};
use url::Url;

const USERNAME_LENGTH: (usize, usize) = (3, 20);
const GUILD_NAME_LENGTH: (usize, usize) = (3, 30);
const GUILD_RANK_LENGTH: (usize, usize) = (1, 20);

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("validator")
        .function("validate", |_, (value, rules): (String, String)| {
            match rules
                .split(',')
                .map(str::trim)
                .filter(|rule| !rule.is_empty())
                .find(|rule| !check_rule(&value, rule))
            {
                Some(failed) => Ok((false, Some(failed.to_string()))),
                None => Ok((true, None)),
            }
        })
        .function("blackList", |lua, value: String| {
            Ok(is_blacklisted(&host(lua)?.config().blacklist, &value))
        })
        .function("validUsername", |lua, name: String| {
            let host = host(lua)?;
            Ok(valid_words(&name, USERNAME_LENGTH, false)
                && !is_blacklisted(&host.config().blacklist, &name))
        })
        .function("validGuildName", |lua, name: String| {
            let host = host(lua)?;
            Ok(valid_words(&name, GUILD_NAME_LENGTH, false)
                && !is_blacklisted(&host.config().blacklist, &name))
        })
        .function("validGuildRank", |_, name: String| {
            Ok(valid_words(&name, GUILD_RANK_LENGTH, true))
        })
        .function("validTown", |lua, name: String| {
            let host = host(lua)?;
            Ok(host.game_data().town_by_name(&name).is_some()
                && allowed(&host.config().new_char_towns, &name))
        })
        .function("validVocation", |lua, name: String| {
            let host = host(lua)?;
            Ok(host.game_data().vocation_by_name(&name).is_some()
                && allowed(&host.config().new_char_vocations, &name))
        })
        .function("validQRToken", |_, (secret, token): (String, String)| {
            Ok(otp::verify(&secret, &token, chrono::Utc::now().timestamp()))
        })
}

fn check_rule(value: &str, rule: &str) -> bool {
    let length = value.chars().count();
    match rule.split_once('=') {
        Some(("min", n)) => n.parse().is_ok_and(|min: usize| length >= min),
        Some(("max", n)) => n.parse().is_ok_and(|max: usize| length <= max),
        _ => match rule {
            "required" => !value.trim().is_empty(),
            "email" => is_email(value),
            "alpha" => value.chars().all(|c| c.is_alphabetic()),
            "alphanum" => value.chars().all(|c| c.is_alphanumeric()),
            "numeric" => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            "url" => Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https")),
            _ => false,
        },
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

/// Letters separated by single spaces, optionally digits.
fn valid_words(name: &str, (min, max): (usize, usize), digits: bool) -> bool {
    let length = name.chars().count();
    (min..=max).contains(&length)
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ' || (digits && c.is_ascii_digit()))
        && !name.starts_with(' ')
        && !name.ends_with(' ')
        && !name.contains("  ")
}

fn is_blacklisted(blacklist: &[String], value: &str) -> bool {
    let value = value.to_lowercase();
    blacklist
        .iter()
        .filter(|word| !word.is_empty())
        .any(|word| value.contains(&word.to_lowercase()))
}

/// An empty allow-list allows everything.
fn allowed(list: &[String], name: &str) -> bool {
    list.is_empty() || list.iter().any(|item| item.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::services::{GameData, Town, Vocation};
    use ember_runtime::{AppConfig, HostContext};

    fn lua() -> mlua::Lua {
        let mut config = AppConfig::default();
        config.blacklist = vec!["admin".to_string(), "gm".to_string()];
        config.new_char_towns = vec!["Thais".to_string()];

        let data = GameData {
            towns: vec![
                Town { id: 1, name: "Thais".into() },
                Town { id: 2, name: "Carlin".into() },
            ],
            houses: Vec::new(),
            vocations: vec![Vocation {
                id: 1,
                name: "Sorcerer".into(),
                description: "a sorcerer".into(),
            }],
        };
        lua_for(module(), HostContext::new(config).with_game_data(data))
    }

    fn check(lua: &mlua::Lua, script: &str) -> bool {
        lua.load(script).eval().unwrap()
    }

    #[test]
    fn test_validate_rules() {
        let lua = lua();
        assert!(check(&lua, r#"return validator:validate("a@b.com", "required,email")"#));

        let (ok, rule): (bool, String) = lua
            .load(r#"return validator:validate("ab", "required,min=3")"#)
            .eval()
            .unwrap();
        assert!(!ok);
        assert_eq!(rule, "min=3");

        assert!(!check(&lua, r#"return validator.validate("", "required")"#));
        assert!(check(&lua, r#"return validator.validate("12345", "numeric,max=5")"#));
        assert!(!check(&lua, r#"return validator.validate("12a", "numeric")"#));
        assert!(check(&lua, r#"return validator.validate("https://x.org", "url")"#));
        assert!(!check(&lua, r#"return validator.validate("ftp://x.org", "url")"#));
        assert!(!check(&lua, r#"return validator.validate("x", "bogus")"#));
    }

    #[test]
    fn test_email() {
        assert!(is_email("player@example.com"));
        assert!(!is_email("player@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@b@example.com"));
    }

    #[test]
    fn test_blacklist() {
        let lua = lua();
        assert!(check(&lua, r#"return validator:blackList("GM Bob")"#));
        assert!(!check(&lua, r#"return validator:blackList("Bob")"#));
    }

    #[test]
    fn test_usernames() {
        let lua = lua();
        assert!(check(&lua, r#"return validator:validUsername("Sir Bob")"#));
        assert!(!check(&lua, r#"return validator:validUsername("Bo")"#));
        assert!(!check(&lua, r#"return validator:validUsername("Sir  Bob")"#));
        assert!(!check(&lua, r#"return validator:validUsername(" Bob")"#));
        assert!(!check(&lua, r#"return validator:validUsername("Bob2")"#));
        assert!(!check(&lua, r#"return validator:validUsername("Admin Bob")"#));
    }

    #[test]
    fn test_guild_names_and_ranks() {
        let lua = lua();
        assert!(check(&lua, r#"return validator:validGuildName("Red Rose")"#));
        assert!(!check(&lua, r#"return validator:validGuildName("Red Rose!")"#));
        assert!(check(&lua, r#"return validator:validGuildRank("Rank 2")"#));
        assert!(!check(&lua, r#"return validator:validGuildRank("")"#));
    }

    #[test]
    fn test_towns_and_vocations() {
        let lua = lua();
        assert!(check(&lua, r#"return validator:validTown("thais")"#));
        assert!(
            !check(&lua, r#"return validator:validTown("Carlin")"#),
            "not allowed for new characters"
        );
        assert!(!check(&lua, r#"return validator:validTown("Atlantis")"#));
        assert!(check(&lua, r#"return validator:validVocation("Sorcerer")"#));
        assert!(!check(&lua, r#"return validator:validVocation("Druid")"#));
    }

    #[test]
    fn test_qr_token_rejects_garbage() {
        let lua = lua();
        assert!(!check(&lua, r#"return validator:validQRToken("GEZDGNBVGY3TQOJQ", "abcdef")"#));
    }
}
