use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;
use crate::types::Value;

static TIMEPERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<time>\d+)(?P<resolution>[smhdw])?$").expect("timeperiod pattern is valid"));

/// Unit steps used to compress a period: seconds → minutes → hours → days → weeks.
const STEPS: [(char, char, u64); 4] = [('s', 'm', 60), ('m', 'h', 60), ('h', 'd', 24), ('d', 'w', 7)];

/// Split a period like `"90"`, `"15m"` or `3600` into its amount and unit.
/// A missing unit means seconds.
pub fn parse_timeperiod(value: &Value) -> Result<(u64, char), ValidationError> {
    match value {
        Value::Int(seconds) if *seconds >= 0 => Ok((*seconds as u64, 's')),
        Value::Text(text) => {
            let captures = TIMEPERIOD.captures(text.trim()).ok_or_else(|| {
                ValidationError::new("timeperiod", format!("{text:?} cannot be parsed as a timeperiod"))
            })?;
            let time = captures["time"]
                .parse()
                .map_err(|_| ValidationError::new("timeperiod", format!("{text:?} is out of range")))?;
            let resolution = captures
                .name("resolution")
                .and_then(|unit| unit.as_str().chars().next())
                .unwrap_or('s');
            Ok((time, resolution))
        }
        other => Err(ValidationError::new(
            "timeperiod",
            format!("{other:?} cannot be cast to a timeperiod"),
        )),
    }
}

/// Render a period in the largest unit that divides it exactly, e.g.
/// `86400` → `1d`, `"120m"` → `2h`.
pub fn format_timeperiod(value: &Value) -> Result<String, ValidationError> {
    let (mut time, mut resolution) = parse_timeperiod(value)?;
    for (current, next, div) in STEPS {
        if resolution == current && time % div == 0 && time != 0 {
            time /= div;
            resolution = next;
        }
    }
    Ok(format!("{time}{resolution}"))
}

/// JSON-encode a value for embedding in an item key.
pub fn escape(value: &serde_json::Value) -> String {
    value.to_string()
}
