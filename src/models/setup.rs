use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Machine {
    pub id: Id,
    pub name: String,
    pub label: String,
    pub section_id: Id,
    pub section_name: String,
    pub section_order_types: Option<String>,
    pub user_count: i64,
    pub job_count: i64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Section {
    pub id: Id,
    pub name: String,
    pub machine_count: i64,
    pub user_count: i64,
    pub order_type_id: Option<Id>,
    pub job_count: i64,
    pub po_code_ids: Vec<Id>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Material {
    pub id: Id,
    pub code: String,
    pub key: String,
    pub value: String,
    pub created_at: String,
    pub material_details: BTreeMap<String, String>,
}

impl Material {
    pub fn has_description(&self) -> bool {
        !self.value.trim().is_empty() || !self.material_details.is_empty()
    }
}

/// Shifts, colours, solvent types, scrap types, downtime reasons, flag
/// reasons and manufacturing order types all share this shape.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Lookup {
    pub id: Id,
    pub name: String,
}
