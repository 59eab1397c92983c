use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Downtime {
    pub id: Id,
    pub shift_id: Id,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub downtime_reason_id: Id,
    pub created_by: Id,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Scrap {
    pub id: Id,
    pub shift_id: Id,
    pub time: String,
    pub scrap_type_id: Id,
    pub weight_kg: f64,
    pub notes: Option<String>,
    pub created_by: Id,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InkUsage {
    pub id: Id,
    pub shift_id: Id,
    pub colour_id: Id,
    pub batch_code: String,
    pub kgs_issued: f64,
    pub created_by: Id,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SolventUsage {
    pub id: Id,
    pub shift_id: Id,
    pub solvent_type_id: Id,
    pub kgs_issued: f64,
    pub created_by: Id,
    pub created_at: String,
    pub updated_at: String,
}
