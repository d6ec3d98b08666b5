//! Durations and sizes written with unit suffixes, like `10s` or `512MiB`.

use std::time::Duration;

use thiserror::Error;

/// Why a duration or size string could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("No number in {kind} value '{input}'")]
    NoNumber { kind: &'static str, input: String },

    #[error("Could not parse {kind} unit '{unit}' (try {hint})")]
    UnknownUnit {
        kind: &'static str,
        unit: String,
        hint: &'static str,
    },

    #[error("Could not parse {kind} number '{number}'")]
    BadNumber { kind: &'static str, number: String },

    #[error("{kind} value '{input}' is negative or too large")]
    OutOfRange { kind: &'static str, input: String },
}

const DURATION: &str = "duration";
const SIZE: &str = "size-in-bytes";

/// Parse a duration such as `100ms`, `1.5 hours` or `10`. A bare number is
/// milliseconds. Unit names are case-sensitive.
pub fn parse_duration(input: &str) -> Result<Duration, UnitError> {
    let (number, unit) = split_units(input);
    if number.is_empty() {
        return Err(UnitError::NoNumber {
            kind: DURATION,
            input: input.to_string(),
        });
    }

    // singular long forms: "second" reads as "seconds"
    let mut long_form = unit.to_string();
    if long_form.len() > 2 && !long_form.ends_with('s') {
        long_form.push('s');
    }
    let nanos_per_unit: u64 = match long_form.as_str() {
        "" | "ms" | "millis" | "milliseconds" => 1_000_000,
        "us" | "micros" | "microseconds" => 1_000,
        "ns" | "nanos" | "nanoseconds" => 1,
        "s" | "seconds" => 1_000_000_000,
        "m" | "minutes" => 60 * 1_000_000_000,
        "h" | "hours" => 60 * 60 * 1_000_000_000,
        "d" | "days" => 24 * 60 * 60 * 1_000_000_000,
        _ => {
            return Err(UnitError::UnknownUnit {
                kind: DURATION,
                unit: unit.to_string(),
                hint: "ns, us, ms, s, m, h, d",
            });
        }
    };

    let nanos = scale(number, u128::from(nanos_per_unit), DURATION, input)?;
    Ok(Duration::from_nanos(nanos))
}

/// Parse a size in bytes such as `512`, `10kB`, `1.5 GiB` or `2 megabytes`.
pub fn parse_bytes(input: &str) -> Result<u64, UnitError> {
    let (number, unit) = split_units(input);
    if number.is_empty() {
        return Err(UnitError::NoNumber {
            kind: SIZE,
            input: input.to_string(),
        });
    }
    let bytes_per_unit = byte_unit(unit).ok_or_else(|| UnitError::UnknownUnit {
        kind: SIZE,
        unit: unit.to_string(),
        hint: "k, K, kB, KiB, kilobytes, kibibytes",
    })?;
    scale(number, bytes_per_unit, SIZE, input)
}

/// Splits `"10 ms"` into `("10", "ms")`: the unit is the run of trailing
/// letters.
fn split_units(input: &str) -> (&str, &str) {
    let s = input.trim();
    let number_end = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map_or(s.len(), |(i, _)| i);
    (s[..number_end].trim(), &s[number_end..])
}

/// `number * per_unit`, exact for plain digits and rounded toward zero
/// otherwise.
fn scale(number: &str, per_unit: u128, kind: &'static str, input: &str) -> Result<u64, UnitError> {
    let out_of_range = || UnitError::OutOfRange {
        kind,
        input: input.to_string(),
    };
    if number.bytes().all(|b| b.is_ascii_digit()) {
        let whole: u128 = number.parse().map_err(|_| out_of_range())?;
        let total = whole.checked_mul(per_unit).ok_or_else(out_of_range)?;
        return u64::try_from(total).map_err(|_| out_of_range());
    }
    let value: f64 = number.parse().map_err(|_| UnitError::BadNumber {
        kind,
        number: number.to_string(),
    })?;
    let total = value * per_unit as f64;
    if !total.is_finite() || total < 0.0 || total >= u64::MAX as f64 {
        return Err(out_of_range());
    }
    Ok(total as u64)
}

const SI_PREFIXES: [&str; 8] = ["kilo", "mega", "giga", "tera", "peta", "exa", "zetta", "yotta"];
const IEC_PREFIXES: [&str; 8] = ["kibi", "mebi", "gibi", "tebi", "pebi", "exbi", "zebi", "yobi"];

fn byte_unit(unit: &str) -> Option<u128> {
    if matches!(unit, "" | "b" | "B" | "byte" | "bytes") {
        return Some(1);
    }
    let long_form = |prefix: &str| {
        unit.strip_prefix(prefix)
            .is_some_and(|rest| rest == "byte" || rest == "bytes")
    };
    for (power, prefix) in (1u32..).zip(SI_PREFIXES) {
        let first = &prefix[..1];
        // kB is the only lowercase SI abbreviation
        let short = if power == 1 {
            format!("{first}B")
        } else {
            format!("{}B", first.to_uppercase())
        };
        if unit == short || long_form(prefix) {
            return Some(1000u128.pow(power));
        }
    }
    for (power, prefix) in (1u32..).zip(IEC_PREFIXES) {
        let first = &prefix[..1];
        let upper = first.to_uppercase();
        let short = unit == first
            || unit == upper
            || unit == format!("{upper}i")
            || unit == format!("{upper}iB");
        if short || long_form(prefix) {
            return Some(1024u128.pow(power));
        }
    }
    None
}
