use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProcessOrder {
    pub id: Id,
    pub process_order: String,
    pub posting_date: String,
    pub shift: String,
    pub description: String,
    pub line: String,
    pub po_code_id: Id,
    pub material_id: Id,
    /// Material number keyed by material code.
    pub material_numbers: BTreeMap<String, String>,
    /// Material description keyed by material number.
    pub material_details: BTreeMap<String, String>,
}

impl ProcessOrder {
    /// Consumable materials as `(number, description)` pairs.
    pub fn materials(&self) -> Vec<(String, String)> {
        self.material_numbers
            .values()
            .map(|number| {
                let description = self
                    .material_details
                    .get(number)
                    .cloned()
                    .unwrap_or_default();
                (number.clone(), description)
            })
            .collect()
    }

    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.process_order.clone()
        } else {
            format!("{} - {}", self.process_order, self.description)
        }
    }
}
