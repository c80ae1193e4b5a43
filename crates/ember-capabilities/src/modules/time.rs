//! `time`: timestamp breakdown and duration strings.

use chrono::{DateTime, Datelike, Timelike};
use ember_runtime::convert::to_lua;
use ember_runtime::CapabilityModule;
use serde::Serialize;

/// A unix timestamp broken down in UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub weekday: String,
    pub result: String,
}

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("time")
        .function("parseUnix", |lua, timestamp: i64| {
            let parsed = parse_unix(timestamp).ok_or_else(|| {
                mlua::Error::runtime(format!("time: timestamp {timestamp} is out of range"))
            })?;
            to_lua(lua, &parsed)
        })
        .function("parseDuration", |_, text: String| {
            parse_duration(&text)
                .ok_or_else(|| mlua::Error::runtime(format!("time: invalid duration {text:?}")))
        })
}

pub fn parse_unix(timestamp: i64) -> Option<ParsedTime> {
    let time = DateTime::from_timestamp(timestamp, 0)?;
    Some(ParsedTime {
        year: time.year(),
        month: time.month(),
        day: time.day(),
        hour: time.hour(),
        minute: time.minute(),
        second: time.second(),
        weekday: time.format("%A").to_string(),
        result: time.format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// Parse a duration such as `1h30m`, `1.5s` or `-300ms` into seconds.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed.
pub fn parse_duration(text: &str) -> Option<f64> {
    let (sign, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Some(0.0);
    }
    if rest.is_empty() {
        return None;
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut seconds = 0.0;
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let value: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        seconds += value * scale;
        rest = &rest[unit_end..];
    }
    Some(sign * seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lua_for;
    use ember_runtime::{AppConfig, HostContext};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_unix() {
        let parsed = parse_unix(1_672_923_600).unwrap();
        assert_eq!(
            parsed,
            ParsedTime {
                year: 2023,
                month: 1,
                day: 5,
                hour: 13,
                minute: 0,
                second: 0,
                weekday: "Thursday".to_string(),
                result: "2023-01-05 13:00:00".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_duration() {
        assert!(close(parse_duration("1h30m").unwrap(), 5400.0));
        assert!(close(parse_duration("1.5s").unwrap(), 1.5));
        assert!(close(parse_duration("300ms").unwrap(), 0.3));
        assert!(close(parse_duration("-2m").unwrap(), -120.0));
        assert!(close(parse_duration("2us").unwrap(), 2e-6));
        assert_eq!(parse_duration("0"), Some(0.0));
    }

    #[test]
    fn test_parse_duration_rejects() {
        for bad in ["", "5", "3d", "h", "1h30", "1..5s", "-"] {
            assert_eq!(parse_duration(bad), None, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_from_script() {
        let lua = lua_for(module(), HostContext::new(AppConfig::default()));
        let ok: bool = lua
            .load(
                r#"
                local t = time:parseUnix(0)
                return t.year == 1970 and t.weekday == "Thursday"
                    and time:parseDuration("2h") == 7200
                "#,
            )
            .eval()
            .unwrap();
        assert!(ok);
        assert!(lua.load(r#"time:parseDuration("soon")"#).exec().is_err());
    }
}
