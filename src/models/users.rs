use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct User {
    pub id: Id,
    pub full_name: String,
    pub staffid: String,
    pub phone_number: Option<String>,
    pub status: String,
    pub role_id: Id,
    pub role_name: String,
    pub page_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub section_ids: Vec<Id>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Role {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
}
