//! Time points and durations.

use serde_json::Value;
use sieve_core::TypeDesc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use super::{mismatch, Coercer, Num};
use crate::defaults::assign_or_skip;
use crate::duration::{from_secs_f64, parse_duration};
use crate::error::CoercionError;
use crate::field::Field;

fn parse_timestamp(text: &str) -> Result<OffsetDateTime, CoercionError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| CoercionError::InvalidTimestamp {
        input: text.to_string(),
        reason: e.to_string(),
    })
}

/// Time points are RFC 3339 strings; any other shape is a mismatch.
impl Field for OffsetDateTime {
    fn zero() -> Self {
        OffsetDateTime::UNIX_EPOCH
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Timestamp
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = match input {
            Value::Null => Self::zero(),
            Value::String(text) => parse_timestamp(text)?,
            other => return Err(mismatch(TypeDesc::Timestamp, other)),
        };
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_or_skip(self, text, parse_timestamp(text).ok());
    }
}

/// Durations accept a unit-suffixed string, a float number of seconds, or
/// an integer number of nanoseconds.
impl Field for Duration {
    fn zero() -> Self {
        Duration::ZERO
    }

    fn type_desc() -> TypeDesc {
        TypeDesc::Duration
    }

    fn coerce(&mut self, input: &Value, _cx: &Coercer<'_>) -> Result<(), CoercionError> {
        *self = match input {
            Value::Null => Duration::ZERO,
            Value::String(text) => {
                parse_duration(text).map_err(|e| CoercionError::InvalidDuration {
                    input: text.clone(),
                    reason: e.to_string(),
                })?
            }
            Value::Number(n) => {
                let num = Num::of(n);
                let converted = match num {
                    Num::Int(nanos) => Some(Duration::nanoseconds(nanos)),
                    Num::Uint(nanos) => i64::try_from(nanos).ok().map(Duration::nanoseconds),
                    Num::Float(secs) => from_secs_f64(secs),
                };
                converted.ok_or_else(|| CoercionError::OutOfRange {
                    value: n.to_string(),
                    target: TypeDesc::Duration,
                })?
            }
            other => return Err(mismatch(TypeDesc::Duration, other)),
        };
        Ok(())
    }

    fn apply_default(&mut self, text: &str) {
        assign_or_skip(self, text, parse_duration(text).ok());
    }
}
