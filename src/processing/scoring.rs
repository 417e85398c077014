//! Score coercion and clamping for untrusted model output

use serde_json::Value;

/// Scale of the overall match percentage.
pub const PERCENT_SCALE: u32 = 100;

/// Best-effort numeric conversion. Anything that cannot be read as a number
/// becomes `0.0`; infinities are kept so clamping sends them to the bounds.
pub fn to_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };

    if number.is_nan() {
        0.0
    } else {
        number
    }
}

/// Clamp into `[0, max]` first, then round half away from zero.
///
/// On the clamped (non-negative) range this is round-half-up: 0.5 -> 1,
/// 83.5 -> 84, 99.5 -> 100.
pub fn clamp_number(number: f64, max: u32) -> u32 {
    let number = if number.is_nan() { 0.0 } else { number };
    number.clamp(0.0, f64::from(max)).round() as u32
}

pub fn clamp_score(value: &Value, max: u32) -> u32 {
    clamp_number(to_number(value), max)
}
