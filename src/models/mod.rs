pub mod operation;
pub mod records;
pub mod sap;
pub mod setup;
pub mod users;

use serde::{Deserialize, Deserializer, Serialize};

pub use operation::{
    EndInputRollPayload, InputRoll, InputRollCreatePayload, Job, JobCreatePayload, OutputRoll,
    OutputRollCreatePayload,
};
pub use records::{Downtime, InkUsage, Scrap, SolventUsage};
pub use sap::ProcessOrder;
pub use setup::{Lookup, Machine, Material, Section};
pub use users::{Role, User};

pub type Id = i64;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct IdPayload {
    pub id: Id,
}

/// Backends disagree on whether weights are strings or numbers; keep the
/// textual form either way.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Id used to look a record up in a reference list.
pub trait Identified {
    fn id(&self) -> Id;
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> Id {
                self.id
            }
        })*
    };
}

identified!(
    Job, InputRoll, OutputRoll, Downtime, Scrap, InkUsage, SolventUsage, Machine, Section,
    Material, Lookup, User, Role, ProcessOrder,
);
