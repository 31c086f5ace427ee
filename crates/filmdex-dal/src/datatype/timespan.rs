//! Serde support for `[-][d.]HH:MM:SS[.fffffff]` duration strings.
//!
//! The catalog stores runtimes in the fixed textual format its original
//! ingest pipeline emits. Durations map to [`jiff::SignedDuration`];
//! fractional seconds carry up to seven digits (100ns ticks).

use jiff::SignedDuration;
use serde::{Deserialize, Deserializer, Serializer};

const SECS_PER_DAY: u64 = 86_400;

/// Formats a duration in the catalog's textual shape.
pub fn format(duration: &SignedDuration) -> String {
    let negative = duration.is_negative();
    let secs = duration.as_secs().unsigned_abs();
    let nanos = duration.subsec_nanos().unsigned_abs();

    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if nanos > 0 {
        // Seven digits of 100ns ticks, trailing zeros trimmed.
        let ticks = format!("{:07}", nanos / 100);
        out.push('.');
        out.push_str(ticks.trim_end_matches('0'));
    }
    out
}

/// Parses a duration from the catalog's textual shape.
pub fn parse(text: &str) -> Result<SignedDuration, String> {
    let err = || format!("invalid duration '{text}', expected [-][d.]HH:MM:SS[.fffffff]");

    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts = rest.split(':');
    let (first, minutes, last) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), None) => (a, b, c),
        _ => return Err(err()),
    };

    // The hour field may carry a day prefix: "d.HH".
    let (days, hours) = match first.split_once('.') {
        Some((days, hours)) => (days.parse::<u64>().map_err(|_| err())?, hours),
        None => (0, first),
    };

    let hours: u64 = hours.parse().map_err(|_| err())?;
    let minutes: u64 = minutes.parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }

    // The second field may carry a fraction: "SS.fffffff".
    let (seconds, ticks) = match last.split_once('.') {
        Some((seconds, fraction)) => {
            if fraction.is_empty()
                || fraction.len() > 7
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(err());
            }
            let padded = format!("{fraction:0<7}");
            (seconds, padded.parse::<u64>().map_err(|_| err())?)
        }
        None => (last, 0),
    };

    let seconds: u64 = seconds.parse().map_err(|_| err())?;
    if seconds > 59 {
        return Err(err());
    }

    let total_secs = days * SECS_PER_DAY + hours * 3600 + minutes * 60 + seconds;
    let sign: i64 = if negative { -1 } else { 1 };

    Ok(SignedDuration::new(
        sign * total_secs as i64,
        sign as i32 * (ticks * 100) as i32,
    ))
}

/// Serde adapter for `Option<SignedDuration>` fields.
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<SignedDuration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&format(duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SignedDuration>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| parse(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}
