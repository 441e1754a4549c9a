use crate::constants::PLACEHOLDER;
use serde_json::Value;

/// Formats a usage value to 3 decimals, or the placeholder when absent or not numeric.
pub fn fmt_usage(value: Option<&Value>) -> String {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(v) if v.is_finite() => format!("{:.3}", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a weight the way the control plane stores it, integers without a fraction.
pub fn fmt_weight(weight: f64) -> String {
    format!("{}", weight)
}

/// Formats unix seconds as local date-time, `0` meaning "never".
pub fn fmt_timestamp(secs: i64) -> String {
    if secs <= 0 {
        return PLACEHOLDER.to_string();
    }

    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => secs.to_string(),
    }
}

/// Age of a unix timestamp relative to `now`, e.g. `12s`, `3m`, `2h`.
pub fn fmt_age(secs: Option<i64>, now: i64) -> String {
    let Some(secs) = secs.filter(|s| *s > 0) else {
        return PLACEHOLDER.to_string();
    };

    let age = now.saturating_sub(secs).max(0);
    match age {
        0..60 => format!("{}s", age),
        60..3600 => format!("{}m", age / 60),
        3600..86400 => format!("{}h", age / 3600),
        _ => format!("{}d", age / 86400),
    }
}
