//! Duration strings such as `1h30m`, `-1.5s` or `300ms`.
//!
//! Grammar: an optional sign followed by one or more `<decimal><unit>`
//! components. Units are `ns`, `us` (also `µs`, `μs`), `ms`, `s`, `m`, `h`.
//! The bare string `0` is accepted. The total must fit in a signed 64-bit
//! count of nanoseconds.

use time::Duration;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Fractional digits beyond this carry no weight at nanosecond resolution.
const MAX_FRACTION_DIGITS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("expected a number")]
    InvalidNumber,
    #[error("missing unit")]
    MissingUnit,
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("duration out of range")]
    Overflow,
}

pub fn parse_duration(text: &str) -> Result<Duration, DurationError> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationError::Empty);
    }

    let limit = i64::MAX as u128 + 1;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = leading_digits(rest);
        let (int_digits, after_int) = rest.split_at(int_len);

        let (frac_digits, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => after_dot.split_at(leading_digits(after_dot)),
            None => ("", after_int),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(DurationError::InvalidNumber);
        }

        let unit_len = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, next) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit);
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| DurationError::UnknownUnit(unit.to_string()))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| DurationError::Overflow)?
        };
        let mut nanos = whole.checked_mul(scale).ok_or(DurationError::Overflow)?;

        if !frac_digits.is_empty() {
            let digits = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
            let frac: u128 = digits.parse().map_err(|_| DurationError::InvalidNumber)?;
            nanos += frac * scale / 10u128.pow(digits.len() as u32);
        }

        total = total.checked_add(nanos).ok_or(DurationError::Overflow)?;
        if total > limit {
            return Err(DurationError::Overflow);
        }
        rest = next;
    }

    let signed = if negative {
        -(total as i128)
    } else {
        total as i128
    };
    let nanos = i64::try_from(signed).map_err(|_| DurationError::Overflow)?;
    Ok(Duration::nanoseconds(nanos))
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// Interpret a float as seconds. `None` when it does not fit.
pub fn from_secs_f64(secs: f64) -> Option<Duration> {
    let nanos = secs * 1e9;
    if nanos.is_finite() && nanos >= i64::MIN as f64 && nanos < i64::MAX as f64 {
        Some(Duration::nanoseconds(nanos as i64))
    } else {
        None
    }
}
