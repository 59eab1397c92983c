use serde::Serialize;

use super::reference::ReferenceData;
use crate::client::{ApiClient, ClientError, Query};
use crate::models::{InkUsage, SolventUsage};
use crate::utils::{format_time, format_weight};

/// Ink and solvent issues shown together.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Consumable {
    Ink(InkUsage),
    Solvent(SolventUsage),
}

impl Consumable {
    pub fn kgs_issued(&self) -> f64 {
        match self {
            Self::Ink(i) => i.kgs_issued,
            Self::Solvent(s) => s.kgs_issued,
        }
    }

    fn created_at(&self) -> &str {
        match self {
            Self::Ink(i) => &i.created_at,
            Self::Solvent(s) => &s.created_at,
        }
    }

    pub fn headers() -> Vec<&'static str> {
        vec![
            "ID",
            "Type",
            "Shift",
            "Item",
            "Batch Code",
            "Kgs Issued",
            "Created By",
            "Created",
        ]
    }

    pub fn cells(&self, refs: &ReferenceData) -> Vec<String> {
        match self {
            Self::Ink(i) => vec![
                i.id.to_string(),
                "Ink".to_string(),
                refs.shift_name(i.shift_id),
                refs.colour_name(i.colour_id),
                i.batch_code.clone(),
                format_weight(i.kgs_issued),
                refs.user_name(i.created_by),
                format_time(Some(&i.created_at)),
            ],
            Self::Solvent(s) => vec![
                s.id.to_string(),
                "Solvent".to_string(),
                refs.shift_name(s.shift_id),
                refs.solvent_type_name(s.solvent_type_id),
                "-".to_string(),
                format_weight(s.kgs_issued),
                refs.user_name(s.created_by),
                format_time(Some(&s.created_at)),
            ],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsumablePage {
    pub records: Vec<Consumable>,
    pub total_count: usize,
    pub ink_kgs: f64,
    pub solvent_kgs: f64,
}

/// Fetches the same page of ink and solvent usage concurrently and merges
/// them newest first. Totals are the sum of both sides.
pub async fn fetch(client: &ApiClient, query: &Query) -> Result<ConsumablePage, ClientError> {
    let (ink, solvent) = futures::try_join!(
        client.get_page::<InkUsage>("/api/ink-usages/filter", query),
        client.get_page::<SolventUsage>("/api/solvent-usages/filter", query),
    )?;
    Ok(merge(ink.data, ink.total_count, solvent.data, solvent.total_count))
}

pub fn merge(
    ink: Vec<InkUsage>,
    ink_total: usize,
    solvent: Vec<SolventUsage>,
    solvent_total: usize,
) -> ConsumablePage {
    let ink_kgs = ink.iter().map(|i| i.kgs_issued).sum();
    let solvent_kgs = solvent.iter().map(|s| s.kgs_issued).sum();
    let mut records: Vec<Consumable> = ink
        .into_iter()
        .map(Consumable::Ink)
        .chain(solvent.into_iter().map(Consumable::Solvent))
        .collect();
    records.sort_by(|a, b| b.created_at().cmp(a.created_at()));
    ConsumablePage {
        records,
        total_count: ink_total + solvent_total,
        ink_kgs,
        solvent_kgs,
    }
}
