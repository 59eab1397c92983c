//! Stats banners. Counts come from the server's `total_count`; every other
//! figure reduces the records on the current page only.

use crate::models::{Downtime, InputRoll, Job, Machine, Material, OutputRoll, Scrap, Section, User};
use crate::utils::{format_minutes, format_meter, format_weight, DAY_SHIFT, NIGHT_SHIFT};

fn stat(label: &str, value: impl ToString) -> (String, String) {
    (label.to_string(), value.to_string())
}

pub fn total_only(total_count: usize) -> Vec<(String, String)> {
    vec![stat("Total", total_count)]
}

pub fn jobs(records: &[Job], total_count: usize) -> Vec<(String, String)> {
    let active = records.iter().filter(|j| j.is_active()).count();
    let consumed: f64 = records.iter().filter_map(|j| j.consumed_weight).sum();
    vec![
        stat("Total", total_count),
        stat("Active", active),
        stat("Consumed", format_weight(consumed)),
    ]
}

pub fn output_rolls(records: &[OutputRoll], total_count: usize) -> Vec<(String, String)> {
    let pending = records.iter().filter(|r| r.is_pending()).count();
    let flagged = records.iter().filter(|r| r.is_flagged()).count();
    let weight: f64 = records.iter().map(|r| r.final_weight).sum();
    let meter: f64 = records.iter().map(|r| r.final_meter).sum();
    vec![
        stat("Total", total_count),
        stat("Pending", pending),
        stat("Flagged", flagged),
        stat("Weight", format_weight(weight)),
        stat("Meter", format_meter(meter)),
    ]
}

pub fn input_rolls(records: &[InputRoll], total_count: usize) -> Vec<(String, String)> {
    let consumed = records.iter().filter(|r| r.is_consumed()).count();
    let weight: f64 = records.iter().filter_map(|r| r.consumed_weight).sum();
    vec![
        stat("Total", total_count),
        stat("Open", records.len() - consumed),
        stat("Consumed", consumed),
        stat("Consumed Weight", format_weight(weight)),
    ]
}

pub fn downtimes(records: &[Downtime], total_count: usize) -> Vec<(String, String)> {
    let minutes_for = |shift: i64| -> i64 {
        records
            .iter()
            .filter(|d| d.shift_id == shift)
            .map(|d| d.duration_minutes)
            .sum()
    };
    let total: i64 = records.iter().map(|d| d.duration_minutes).sum();
    vec![
        stat("Records", total_count),
        stat("Total", format_minutes(total)),
        stat("Day", format_minutes(minutes_for(DAY_SHIFT))),
        stat("Night", format_minutes(minutes_for(NIGHT_SHIFT))),
    ]
}

pub fn scraps(records: &[Scrap], total_count: usize) -> Vec<(String, String)> {
    let weight_for = |shift: i64| -> f64 {
        records
            .iter()
            .filter(|s| s.shift_id == shift)
            .map(|s| s.weight_kg)
            .sum()
    };
    let total: f64 = records.iter().map(|s| s.weight_kg).sum();
    vec![
        stat("Records", total_count),
        stat("Total", format_weight(total)),
        stat("Day", format_weight(weight_for(DAY_SHIFT))),
        stat("Night", format_weight(weight_for(NIGHT_SHIFT))),
    ]
}

pub fn issued(
    label: &str,
    kgs: impl Iterator<Item = f64>,
    total_count: usize,
) -> Vec<(String, String)> {
    vec![
        stat(label, total_count),
        stat("Kgs Issued", format_weight(kgs.sum())),
    ]
}

pub fn machines(records: &[Machine], total_count: usize) -> Vec<(String, String)> {
    vec![
        stat("Machines", total_count),
        stat("Users", records.iter().map(|m| m.user_count).sum::<i64>()),
        stat("Jobs", records.iter().map(|m| m.job_count).sum::<i64>()),
    ]
}

pub fn sections(records: &[Section], total_count: usize) -> Vec<(String, String)> {
    vec![
        stat("Sections", total_count),
        stat("Machines", records.iter().map(|s| s.machine_count).sum::<i64>()),
        stat("Users", records.iter().map(|s| s.user_count).sum::<i64>()),
        stat("Jobs", records.iter().map(|s| s.job_count).sum::<i64>()),
    ]
}

pub fn materials(records: &[Material], total_count: usize) -> Vec<(String, String)> {
    let missing = records.iter().filter(|m| !m.has_description()).count();
    vec![
        stat("Materials", total_count),
        stat("Without Descriptions", missing),
    ]
}

pub fn users(records: &[User], total_count: usize) -> Vec<(String, String)> {
    let active = records.iter().filter(|u| u.is_active()).count();
    vec![
        stat("Total", total_count),
        stat("Active", active),
        stat("Inactive", records.len() - active),
    ]
}

pub fn consumables(
    records: usize,
    ink_kgs: f64,
    solvent_kgs: f64,
) -> Vec<(String, String)> {
    vec![
        stat("Records", records),
        stat("Ink", format_weight(ink_kgs)),
        stat("Solvent", format_weight(solvent_kgs)),
        stat("Total Weight", format_weight(ink_kgs + solvent_kgs)),
    ]
}
