use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{Id, InputRoll};
use crate::utils::{parse_date, parse_timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollStatus {
    Open,
    Consumed,
}

/// Filters applied locally: `/api/input-rolls` returns the whole set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputRollFilter {
    pub process_order: Option<String>,
    pub batch: Option<String>,
    pub material_description: Option<String>,
    pub created_by: Option<Id>,
    pub status: Option<RollStatus>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| day_start(date))
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

impl InputRollFilter {
    /// Builds a filter from `key=value` pairs that were already checked
    /// against the allowed keys.
    pub fn from_pairs(filters: &BTreeMap<String, String>) -> Result<Self, String> {
        let mut out = Self::default();
        for (key, value) in filters {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "process_order" => out.process_order = Some(value.to_string()),
                "batch" => out.batch = Some(value.to_string()),
                "material_description" => out.material_description = Some(value.to_string()),
                "created_by" => {
                    out.created_by = Some(
                        value
                            .parse::<Id>()
                            .map_err(|_| format!("created_by must be a user id, got '{value}'"))?,
                    )
                }
                "status" => {
                    out.status = Some(match value.to_lowercase().as_str() {
                        "open" => RollStatus::Open,
                        "consumed" => RollStatus::Consumed,
                        other => {
                            return Err(format!("status must be open or consumed, got '{other}'"))
                        }
                    })
                }
                "start_date" => out.start = Some(day_start(parse_date(value)?)),
                "end_date" => out.end = Some(day_end(parse_date(value)?)),
                _ => {}
            }
        }
        Ok(out)
    }

    pub fn matches(&self, roll: &InputRoll) -> bool {
        if let Some(po) = &self.process_order {
            if !contains_ci(roll.process_order.as_deref(), po) {
                return false;
            }
        }
        if let Some(batch) = &self.batch {
            if !contains_ci(Some(&roll.batch), batch) {
                return false;
            }
        }
        if let Some(desc) = &self.material_description {
            if !contains_ci(roll.material_description.as_deref(), desc) {
                return false;
            }
        }
        if let Some(user) = self.created_by {
            if roll.created_by != user {
                return false;
            }
        }
        match self.status {
            Some(RollStatus::Open) if roll.is_consumed() => return false,
            Some(RollStatus::Consumed) if !roll.is_consumed() => return false,
            _ => {}
        }
        if self.start.is_some() || self.end.is_some() {
            let Some(created) = parse_timestamp(&roll.created_at) else {
                return false;
            };
            if self.start.is_some_and(|s| created < s) || self.end.is_some_and(|e| created > e) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, rolls: Vec<InputRoll>) -> Vec<InputRoll> {
        rolls.into_iter().filter(|r| self.matches(r)).collect()
    }
}
