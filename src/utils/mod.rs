use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};

pub const DAY_SHIFT: i64 = 1;
pub const NIGHT_SHIFT: i64 = 2;

const WEIGHT_UNITS: [&str; 5] = ["kg", "t", "kt", "Mt", "Gt"];
const METER_UNITS: [&str; 5] = ["m", "km", "Mm", "Gm", "Tm"];
const MAX_PER_PAGE_OPTIONS: usize = 5;
const FALLBACK_PER_PAGE: usize = 10;

fn scale_units(mut value: f64, units: &[&str]) -> String {
    let mut i = 0;
    while value >= 1000.0 && i < units.len() - 1 {
        value /= 1000.0;
        i += 1;
    }
    format!("{:.2} {}", value, units[i])
}

pub fn format_weight(kg: f64) -> String {
    scale_units(kg, &WEIGHT_UNITS)
}

pub fn format_meter(m: f64) -> String {
    scale_units(m, &METER_UNITS)
}

/// Long form used by the downtime views: `"45 min"`, `"2h"`, `"1h 5m"`.
pub fn format_downtime(minutes: i64) -> String {
    if minutes == 0 {
        return "0 min".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} min");
    }
    hours_and_minutes(minutes)
}

/// Compact form used by stats banners: `"45m"`, `"2h"`, `"1h 5m"`.
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    hours_and_minutes(minutes)
}

fn hours_and_minutes(minutes: i64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}

/// Accepts the backend's `YYYY-MM-DD HH:MM:SS`, ISO-8601 with or without an
/// offset, `datetime-local` input values, and bare dates.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_time(value: Option<&str>) -> String {
    match value.and_then(parse_timestamp) {
        Some(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_date(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

pub fn format_date_time(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

pub fn truncate_text(text: Option<&str>, max_len: usize) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return "N/A".to_string(),
    };
    if text.chars().count() > max_len {
        let head: String = text.chars().take(max_len).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerPageOption {
    pub value: usize,
    pub label: String,
    pub selected: bool,
}

/// Up to five page sizes spread evenly over `total_count`, the last one
/// labelled "All". Zero-sized and duplicate entries are dropped; an empty
/// result falls back to a single option of 10.
pub fn per_page_options(total_count: usize, current: usize) -> Vec<PerPageOption> {
    let step = total_count.div_ceil(MAX_PER_PAGE_OPTIONS);
    let mut seen: HashSet<usize> = HashSet::new();
    let mut values: Vec<usize> = Vec::new();
    for i in 1..=MAX_PER_PAGE_OPTIONS {
        let value = (i * step).min(total_count);
        if value > 0 && seen.insert(value) {
            values.push(value);
        }
    }
    if values.is_empty() {
        values.push(FALLBACK_PER_PAGE);
    }
    values
        .into_iter()
        .map(|value| PerPageOption {
            value,
            label: if value == total_count {
                "All".to_string()
            } else {
                value.to_string()
            },
            selected: value == current,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Pagination {
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    pub fn start_item(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.offset() + 1).min(self.total)
        }
    }

    pub fn end_item(&self) -> usize {
        (self.page * self.per_page).min(self.total)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    /// `None` when everything fits on one page.
    pub fn footer(&self) -> Option<String> {
        if self.total_pages() <= 1 {
            return None;
        }
        Some(format!(
            "Showing {} to {} of {} entries (page {}/{})",
            self.start_item(),
            self.end_item(),
            self.total,
            self.page,
            self.total_pages()
        ))
    }
}

/// A page size larger than the result set shrinks to the result set.
pub fn clamp_per_page(per_page: usize, total_count: usize) -> usize {
    if total_count > 0 && per_page > total_count {
        total_count
    } else {
        per_page
    }
}

pub fn shift_for_hour(hour: u32) -> i64 {
    if (7..19).contains(&hour) {
        DAY_SHIFT
    } else {
        NIGHT_SHIFT
    }
}

pub fn current_shift() -> i64 {
    shift_for_hour(Local::now().hour())
}

pub fn shift_label(shift_id: i64) -> &'static str {
    if shift_id == DAY_SHIFT {
        "Day"
    } else {
        "Night"
    }
}

pub fn check_time_in_shift(shift_id: i64, time: NaiveDateTime) -> Result<(), String> {
    let hour = time.hour();
    if shift_id == DAY_SHIFT && !(7..19).contains(&hour) {
        return Err("Morning shift allows time between 7:00 AM and 7:00 PM only".to_string());
    }
    if shift_id == NIGHT_SHIFT && (7..19).contains(&hour) {
        return Err("Night shift allows time between 7:00 PM and 7:00 AM only".to_string());
    }
    Ok(())
}

pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let seconds = (end - start).num_seconds();
    ((seconds as f64) / 60.0).round().max(0.0) as i64
}

pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| "expected format KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("filter key is empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn parse_on_off(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_switches_unit_at_one_thousand() {
        assert_eq!(format_weight(999.0), "999.00 kg");
        assert_eq!(format_weight(1000.0), "1.00 t");
        assert_eq!(format_weight(1_500_000.0), "1.50 kt");
        assert_eq!(format_weight(0.0), "0.00 kg");
    }

    #[test]
    fn weight_stops_at_largest_unit() {
        assert_eq!(format_weight(5e15), "5000.00 Gt");
    }

    #[test]
    fn meter_switches_unit_at_one_thousand() {
        assert_eq!(format_meter(999.99), "999.99 m");
        assert_eq!(format_meter(1000.0), "1.00 km");
        assert_eq!(format_meter(2_345_000.0), "2.35 Mm");
    }

    #[test]
    fn downtime_formats() {
        assert_eq!(format_downtime(0), "0 min");
        assert_eq!(format_downtime(59), "59 min");
        assert_eq!(format_downtime(60), "1h");
        assert_eq!(format_downtime(125), "2h 5m");
    }

    #[test]
    fn compact_minutes_formats() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(61), "1h 1m");
    }

    #[test]
    fn time_formatting_handles_backend_and_iso_values() {
        assert_eq!(format_time(Some("2024-03-05 14:07:00")), "05/03/2024 14:07");
        assert_eq!(format_time(Some("2024-03-05T08:30")), "05/03/2024 08:30");
        assert_eq!(format_time(Some("not a date")), "-");
        assert_eq!(format_time(None), "-");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_text(None, 5), "N/A");
        assert_eq!(truncate_text(Some(""), 5), "N/A");
        assert_eq!(truncate_text(Some("short"), 5), "short");
        assert_eq!(truncate_text(Some("longer text"), 6), "longer...");
    }

    #[test]
    fn per_page_options_spread_over_total() {
        let opts = per_page_options(50, 10);
        let values: Vec<usize> = opts.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![10, 20, 30, 40, 50]);
        assert_eq!(opts[4].label, "All");
        assert!(opts[0].selected);
    }

    #[test]
    fn per_page_options_never_duplicate() {
        let opts = per_page_options(3, 10);
        let values: Vec<usize> = opts.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
        let unique: HashSet<usize> = values.iter().copied().collect();
        assert_eq!(unique.len(), values.len());
    }

    #[test]
    fn per_page_options_never_empty() {
        let opts = per_page_options(0, 10);
        assert_eq!(opts.len(), 1);
        assert_eq!(opts[0].value, 10);
        assert!(opts[0].selected);

        let single = per_page_options(1, 10);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].label, "All");
    }

    #[test]
    fn pagination_empty_result() {
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages(), 0);
        assert_eq!(p.start_item(), 0);
        assert_eq!(p.end_item(), 0);
        assert!(!p.has_next());
        assert!(!p.has_prev());
        assert!(p.footer().is_none());
    }

    #[test]
    fn pagination_single_item() {
        let p = Pagination::new(1, 10, 1);
        assert_eq!(p.total_pages(), 1);
        assert_eq!((p.start_item(), p.end_item()), (1, 1));
        assert!(p.footer().is_none());
    }

    #[test]
    fn pagination_exactly_one_page() {
        let p = Pagination::new(1, 10, 10);
        assert_eq!(p.total_pages(), 1);
        assert_eq!((p.start_item(), p.end_item()), (1, 10));
        assert!(!p.has_next());
    }

    #[test]
    fn pagination_multi_page() {
        let p = Pagination::new(3, 10, 25);
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.offset(), 20);
        assert_eq!((p.start_item(), p.end_item()), (21, 25));
        assert!(p.has_prev());
        assert!(!p.has_next());
        assert_eq!(
            p.footer().as_deref(),
            Some("Showing 21 to 25 of 25 entries (page 3/3)")
        );
    }

    #[test]
    fn pagination_clamps_page_and_slices() {
        let p = Pagination::new(0, 0, 4);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);

        let items = [1, 2, 3, 4, 5];
        let p = Pagination::new(2, 2, items.len());
        assert_eq!(p.slice(&items), &[3, 4]);
        let past_end = Pagination::new(9, 2, items.len());
        assert!(past_end.slice(&items).is_empty());
    }

    #[test]
    fn per_page_clamped_to_total() {
        assert_eq!(clamp_per_page(10, 4), 4);
        assert_eq!(clamp_per_page(10, 0), 10);
        assert_eq!(clamp_per_page(5, 40), 5);
    }

    #[test]
    fn shift_boundaries() {
        assert_eq!(shift_for_hour(6), NIGHT_SHIFT);
        assert_eq!(shift_for_hour(7), DAY_SHIFT);
        assert_eq!(shift_for_hour(18), DAY_SHIFT);
        assert_eq!(shift_for_hour(19), NIGHT_SHIFT);
    }

    #[test]
    fn shift_time_window() {
        let morning = parse_timestamp("2024-01-01 08:00:00").unwrap();
        let night = parse_timestamp("2024-01-01 22:00:00").unwrap();
        assert!(check_time_in_shift(DAY_SHIFT, morning).is_ok());
        assert!(check_time_in_shift(DAY_SHIFT, night).is_err());
        assert!(check_time_in_shift(NIGHT_SHIFT, night).is_ok());
        assert!(check_time_in_shift(NIGHT_SHIFT, morning).is_err());
    }

    #[test]
    fn duration_never_negative() {
        let a = parse_timestamp("2024-01-01 08:00").unwrap();
        let b = parse_timestamp("2024-01-01 09:30").unwrap();
        assert_eq!(duration_minutes(a, b), 90);
        assert_eq!(duration_minutes(b, a), 0);
    }

    #[test]
    fn key_value_filters() {
        assert_eq!(
            parse_key_value("shift_id=1").unwrap(),
            ("shift_id".to_string(), "1".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
        assert!(parse_on_off("maybe").is_err());
        assert!(parse_on_off("ON").unwrap());
    }
}
