//! Durations in offchain JSON, written the way Go's `time.Duration` prints
//! them (`"1h0m0s"`, `"3m0s"`, `"1.5s"`, `"250ms"`).

use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

const NANOS_PER_SEC: u128 = 1_000_000_000;

pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(*value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(serde::de::Error::custom)
}

pub fn format(value: Duration) -> String {
    let nanos = value.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_SEC {
        let (unit, scale) = match nanos {
            n if n < 1_000 => ("ns", 1),
            n if n < 1_000_000 => ("µs", 1_000),
            _ => ("ms", 1_000_000),
        };
        return format!("{}{}", decimal(nanos, scale), unit);
    }

    let secs = value.as_secs();
    let mut out = String::new();
    if secs >= 3_600 {
        let _ = write!(out, "{}h", secs / 3_600);
    }
    if secs >= 60 {
        let _ = write!(out, "{}m", (secs / 60) % 60);
    }
    let sub_minute = u128::from(secs % 60) * NANOS_PER_SEC + u128::from(value.subsec_nanos());
    let _ = write!(out, "{}s", decimal(sub_minute, NANOS_PER_SEC));
    out
}

/// `value / scale` with the remainder as trimmed decimal digits.
fn decimal(value: u128, scale: u128) -> String {
    let (whole, rem) = (value / scale, value % scale);
    if rem == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let frac = format!("{:0width$}", rem, width = width);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Parses a sequence of decimal numbers with unit suffixes (`ns`, `us`,
/// `µs`, `ms`, `s`, `m`, `h`). Negative durations are rejected.
pub fn parse(text: &str) -> Result<Duration, String> {
    let mut rest = text.strip_prefix('+').unwrap_or(text);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() || rest.starts_with('-') {
        return Err(format!("invalid duration {:?}", text));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err(format!("missing unit in duration {:?}", text)),
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, text)),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(format!("invalid duration {:?}", text));
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| format!("invalid duration {:?}", text))?
        };

        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("duration {:?} overflows", text))?;
        let mut digit_scale = scale;
        for c in frac.chars() {
            let digit = c.to_digit(10).ok_or_else(|| format!("invalid duration {:?}", text))?;
            digit_scale /= 10;
            value += u128::from(digit) * digit_scale;
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| format!("duration {:?} overflows", text))?;
        rest = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| format!("duration {:?} overflows", text))?;
    Ok(Duration::from_nanos(nanos))
}
