use serde::{Deserialize, Serialize};

use super::{lenient_f64, string_or_number, Id};

/// A job joined with its current input roll.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Job {
    pub id: Id,
    pub shift_id: Id,
    pub input_roll_id: Id,
    pub production_order: String,
    pub batch: String,
    #[serde(deserialize_with = "string_or_number")]
    pub start_weight: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub start_meter: Option<f64>,
    pub created_by: Id,
    pub machine_id: Id,
    pub created_at: String,
    pub updated_at: String,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub consumed_weight: Option<f64>,
    pub material_number: Option<String>,
    pub last_updated: String,
}

impl Job {
    pub fn start_weight_kg(&self) -> Option<f64> {
        self.start_weight.trim().parse::<f64>().ok()
    }

    /// Not ended and its input roll not yet consumed.
    pub fn is_active(&self) -> bool {
        self.end_datetime.as_deref().map_or(true, str::is_empty) && self.consumed_weight.is_none()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InputRoll {
    pub id: Id,
    pub job_id: Id,
    pub batch: String,
    pub material_document: Option<String>,
    pub material_number: Option<String>,
    pub material_description: Option<String>,
    pub process_order: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub start_meter: Option<f64>,
    pub created_by: Id,
    #[serde(deserialize_with = "string_or_number")]
    pub start_weight: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub consumed_weight: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl InputRoll {
    pub fn is_consumed(&self) -> bool {
        self.consumed_weight.is_some_and(|w| w > 0.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputRoll {
    pub id: Id,
    pub output_batch: String,
    pub final_meter: f64,
    pub flag_reason: Option<String>,
    pub final_weight: f64,
    pub core_weight: Option<f64>,
    pub input_roll_id: Id,
    pub job_id: Id,
    pub from_input_batch: String,
    pub flag_count: i64,
    pub created_by: Id,
    pub operator_name: Option<String>,
    pub updated_by: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
}

impl OutputRoll {
    /// Still waiting for its weight from the scale.
    pub fn is_pending(&self) -> bool {
        self.final_weight == 0.0
    }

    pub fn is_flagged(&self) -> bool {
        self.flag_count > 0 || self.flag_reason.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct InputRollCreatePayload {
    pub job_id: Id,
    pub batch: String,
    pub material_document: Option<String>,
    pub material_number: String,
    pub start_meter: f64,
    pub start_weight: String,
    pub consumed_weight: Option<f64>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct JobCreatePayload {
    pub machine_id: Id,
    pub shift_id: Id,
    pub production_order: String,
    pub input_roll: InputRollCreatePayload,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EndInputRollPayload {
    pub id: Id,
    pub weight_unit: String,
    pub posting_date: String,
    pub batch: String,
    pub input_roll_id: Id,
    pub consumed_weight: String,
    pub material_number: String,
    pub production_order: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OutputRollCreatePayload {
    pub final_meter: f64,
    pub batch: String,
    pub flag_reason: Option<String>,
    pub core_weight: Option<f64>,
    pub shift_id: Id,
    pub job_id: Id,
    pub machine_id: Id,
    pub input_roll_id: Id,
    pub flag_count: i64,
}
