use serde_json::{Map, Value};

use crate::utils::{check_time_in_shift, duration_minutes, parse_timestamp};

fn field_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn field_shift(obj: &Map<String, Value>) -> Option<i64> {
    match obj.get("shift_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn checked_time(
    obj: &Map<String, Value>,
    key: &str,
    shift: Option<i64>,
) -> Result<Option<chrono::NaiveDateTime>, String> {
    let Some(raw) = field_str(obj, key) else {
        return Ok(None);
    };
    let time = parse_timestamp(raw).ok_or_else(|| format!("{key} is not a valid date/time"))?;
    if let Some(shift) = shift {
        check_time_in_shift(shift, time)?;
    }
    Ok(Some(time))
}

/// Downtime documents get `duration_minutes` derived from the start/end
/// pair; both times must sit inside the chosen shift.
pub fn prepare_downtime(mut doc: Value) -> Result<Value, String> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| "downtime payload must be a JSON object".to_string())?;
    let shift = field_shift(obj);
    let start = checked_time(obj, "start_time", shift)?;
    let end = checked_time(obj, "end_time", shift)?;
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            return Err("end_time must be after start_time".to_string());
        }
        obj.insert(
            "duration_minutes".to_string(),
            Value::from(duration_minutes(start, end)),
        );
    }
    Ok(doc)
}

/// Scrap time must fall inside the chosen shift.
pub fn prepare_scrap(doc: Value) -> Result<Value, String> {
    let obj = doc
        .as_object()
        .ok_or_else(|| "scrap payload must be a JSON object".to_string())?;
    checked_time(obj, "time", field_shift(obj))?;
    Ok(doc)
}
