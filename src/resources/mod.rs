pub mod columns;
pub mod consumables;
pub mod input_rolls;
pub mod payload;
pub mod reference;
pub mod stats;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::{ApiClient, ClientError, Page, Query};
use crate::models::{
    Downtime, IdPayload, InkUsage, InputRoll, Job, Lookup, Machine, Material, OutputRoll, Role,
    Scrap, Section, SolventUsage, User,
};
use crate::output::Table;
use crate::utils::{clamp_per_page, per_page_options, Pagination, PerPageOption};

pub use columns::Record;
pub use input_rolls::InputRollFilter;
pub use reference::{Needs, ReferenceData};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unknown resource '{name}' (expected one of: {expected})")]
    UnknownResource { name: String, expected: String },

    #[error("'{key}' is not a filter for {resource} (allowed: {allowed})")]
    UnknownFilter {
        key: String,
        resource: String,
        allowed: String,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("update payload for {resource} needs a positive \"id\"")]
    MissingId { resource: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{resource} is a combined view; change ink-usages or solvent-usages instead")]
    ReadOnly { resource: String },

    #[error("failed to encode records: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    Shifts,
    Colours,
    SolventTypes,
    ScrapTypes,
    DowntimeReasons,
    FlagReasons,
}

impl LookupKind {
    pub const ALL: [LookupKind; 6] = [
        Self::Shifts,
        Self::Colours,
        Self::SolventTypes,
        Self::ScrapTypes,
        Self::DowntimeReasons,
        Self::FlagReasons,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shifts => "shifts",
            Self::Colours => "colours",
            Self::SolventTypes => "solvent-types",
            Self::ScrapTypes => "scrap-types",
            Self::DowntimeReasons => "downtime-reasons",
            Self::FlagReasons => "flag-reasons",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Jobs,
    OutputRolls,
    InputRolls,
    Downtimes,
    Scraps,
    InkUsages,
    SolventUsages,
    Consumables,
    Machines,
    Sections,
    Materials,
    Users,
    Roles,
    Lookup(LookupKind),
}

const NAMED: [(&str, ResourceKind); 13] = [
    ("jobs", ResourceKind::Jobs),
    ("output-rolls", ResourceKind::OutputRolls),
    ("input-rolls", ResourceKind::InputRolls),
    ("downtimes", ResourceKind::Downtimes),
    ("scraps", ResourceKind::Scraps),
    ("ink-usages", ResourceKind::InkUsages),
    ("solvent-usages", ResourceKind::SolventUsages),
    ("consumables", ResourceKind::Consumables),
    ("machines", ResourceKind::Machines),
    ("sections", ResourceKind::Sections),
    ("materials", ResourceKind::Materials),
    ("users", ResourceKind::Users),
    ("roles", ResourceKind::Roles),
];

impl ResourceKind {
    /// Every accepted resource name, lookups included.
    pub fn names() -> Vec<&'static str> {
        NAMED
            .iter()
            .map(|(name, _)| *name)
            .chain(LookupKind::ALL.iter().map(|k| k.as_str()))
            .collect()
    }

    pub fn parse(raw: &str) -> Result<Self, ResourceError> {
        let name = raw.trim().to_lowercase().replace('_', "-");
        let alias = match name.as_str() {
            "rolls" => "output-rolls",
            "downtime" => "downtimes",
            "scrap" => "scraps",
            "ink" => "ink-usages",
            "solvent" => "solvent-usages",
            other => other,
        };
        NAMED
            .iter()
            .find(|(n, _)| *n == alias)
            .map(|(_, kind)| *kind)
            .or_else(|| {
                LookupKind::ALL
                    .iter()
                    .find(|k| k.as_str() == alias)
                    .map(|k| Self::Lookup(*k))
            })
            .ok_or_else(|| ResourceError::UnknownResource {
                name: raw.to_string(),
                expected: Self::names().join(", "),
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Lookup(kind) => kind.as_str(),
            other => NAMED
                .iter()
                .find(|(_, k)| *k == other)
                .map(|(name, _)| *name)
                .unwrap_or("unknown"),
        }
    }

    /// Route prefix for create/update/delete. `None` for combined views.
    pub fn base_route(self) -> Option<String> {
        match self {
            Self::Consumables => None,
            Self::Lookup(kind) => Some(format!("/api/lookups/{}", kind.as_str())),
            other => Some(format!("/api/{}", other.name())),
        }
    }

    pub fn list_route(self) -> String {
        match self {
            Self::Jobs => "/api/jobs/filter-with-input-rolls".to_string(),
            Self::InputRolls => "/api/input-rolls".to_string(),
            Self::Roles => "/api/roles".to_string(),
            Self::Lookup(kind) => format!("/api/lookups/{}", kind.as_str()),
            Self::Consumables => "/api/ink-usages/filter".to_string(),
            other => format!("/api/{}/filter", other.name()),
        }
    }

    /// Server-side paging; the rest are fetched whole and paged locally.
    pub fn is_paginated(self) -> bool {
        !matches!(self, Self::InputRolls | Self::Roles | Self::Lookup(_))
    }

    pub fn filter_keys(self) -> &'static [&'static str] {
        match self {
            Self::Jobs => &[
                "machine_id",
                "shift_id",
                "created_by",
                "status",
                "production_order",
                "start_date",
                "end_date",
            ],
            Self::OutputRolls => &[
                "job_id",
                "shift_id",
                "output_batch",
                "flag_reason",
                "created_by",
                "section_ids",
                "start_date",
                "end_date",
                "status",
                "production_order",
            ],
            Self::InputRolls => &[
                "process_order",
                "batch",
                "material_description",
                "created_by",
                "status",
                "start_date",
                "end_date",
            ],
            Self::Downtimes => &[
                "shift_id",
                "downtime_reason_id",
                "start_date",
                "end_date",
                "created_by",
            ],
            Self::Scraps => &[
                "shift_id",
                "scrap_type_id",
                "created_by",
                "start_date",
                "end_date",
            ],
            Self::InkUsages => &[
                "shift_id",
                "colour_id",
                "batch_code",
                "created_by",
                "start_date",
                "end_date",
            ],
            Self::SolventUsages => &[
                "shift_id",
                "solvent_type_id",
                "created_by",
                "start_date",
                "end_date",
            ],
            Self::Consumables => &["shift_id", "created_by", "start_date", "end_date"],
            Self::Machines => &[
                "name",
                "label",
                "section_id",
                "has_users",
                "has_jobs",
                "user_id",
            ],
            Self::Sections => &["name", "has_machines", "has_users", "has_order_type"],
            Self::Materials => &["code", "key", "has_descriptions"],
            Self::Users => &[
                "full_name",
                "staffid",
                "status",
                "role_id",
                "section_id",
                "page_id",
                "start_date",
                "end_date",
            ],
            Self::Roles | Self::Lookup(_) => &[],
        }
    }

    /// Reference lists joined into this resource's table.
    pub fn needs(self) -> Needs {
        let with_users = Needs {
            users: true,
            ..Needs::default()
        };
        match self {
            Self::Jobs => Needs {
                machines: true,
                shifts: true,
                ..with_users
            },
            Self::OutputRolls | Self::InputRolls => with_users,
            Self::Downtimes => Needs {
                shifts: true,
                downtime_reasons: true,
                ..with_users
            },
            Self::Scraps => Needs {
                shifts: true,
                scrap_types: true,
                ..with_users
            },
            Self::InkUsages => Needs {
                shifts: true,
                colours: true,
                ..with_users
            },
            Self::SolventUsages => Needs {
                shifts: true,
                solvent_types: true,
                ..with_users
            },
            Self::Consumables => Needs {
                shifts: true,
                colours: true,
                solvent_types: true,
                ..with_users
            },
            Self::Users => Needs {
                sections: true,
                ..Needs::default()
            },
            Self::Machines | Self::Sections | Self::Materials | Self::Roles | Self::Lookup(_) => {
                Needs::default()
            }
        }
    }

    pub fn check_filters(self, filters: &BTreeMap<String, String>) -> Result<(), ResourceError> {
        let allowed = self.filter_keys();
        for key in filters.keys() {
            if !allowed.contains(&key.as_str()) {
                return Err(ResourceError::UnknownFilter {
                    key: key.clone(),
                    resource: self.name().to_string(),
                    allowed: if allowed.is_empty() {
                        "none".to_string()
                    } else {
                        allowed.join(", ")
                    },
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListRequest {
    pub page: usize,
    pub per_page: usize,
    pub filters: BTreeMap<String, String>,
    pub detailed: bool,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            filters: BTreeMap::new(),
            detailed: false,
        }
    }
}

/// A rendered page of one resource.
#[derive(Clone, Debug)]
pub struct Listing {
    pub table: Table,
    pub stats: Vec<(String, String)>,
    pub pagination: Pagination,
    pub per_page_options: Vec<PerPageOption>,
    pub records: Value,
}

#[derive(Clone, Copy)]
enum Window {
    Page { page: usize, per_page: usize },
    All,
}

struct Collected {
    table: Table,
    stats: Vec<(String, String)>,
    pagination: Pagination,
    records: Value,
}

fn filter_query(filters: &BTreeMap<String, String>) -> Query {
    filters
        .iter()
        .fold(Query::new(), |q, (key, value)| q.push(key, value.trim()))
}

async fn fetch_paged<T: Record>(
    client: &ApiClient,
    route: &str,
    filters: &Query,
    page: usize,
    per_page: usize,
) -> Result<Page<T>, ClientError> {
    let query = filters
        .clone()
        .push("page", page)
        .push("per_page", per_page);
    client.get_page(route, &query).await
}

fn to_value<T: serde::Serialize + ?Sized>(records: &T) -> Result<Value, ResourceError> {
    serde_json::to_value(records).map_err(|e| ResourceError::Encode { source: e })
}

fn build_table<T: Record>(records: &[T], refs: &ReferenceData, detailed: bool) -> Table {
    let mut table = Table::new(T::headers(detailed));
    for record in records {
        table.push(record.cells(refs, detailed));
    }
    table
}

async fn collect<T, F>(
    client: &ApiClient,
    kind: ResourceKind,
    filters: &BTreeMap<String, String>,
    window: Window,
    detailed: bool,
    local_filter: F,
) -> Result<Collected, ResourceError>
where
    T: Record,
    F: FnOnce(Vec<T>) -> Vec<T>,
{
    let route = kind.list_route();
    let refs = ReferenceData::load(client, kind.needs());

    if kind.is_paginated() {
        let query = filter_query(filters);
        let (refs, records, total, pagination) = match window {
            Window::Page { page, per_page } => {
                let (refs, fetched) =
                    futures::try_join!(refs, fetch_paged::<T>(client, &route, &query, page, per_page))?;
                let pagination = Pagination::new(page, per_page, fetched.total_count);
                (refs, fetched.data, fetched.total_count, pagination)
            }
            Window::All => {
                let (refs, probe) =
                    futures::try_join!(refs, fetch_paged::<T>(client, &route, &query, 1, 1))?;
                let total = probe.total_count;
                let records = if total > probe.data.len() {
                    debug!("exporting {} {} records", total, kind);
                    fetch_paged::<T>(client, &route, &query, 1, total).await?.data
                } else {
                    probe.data
                };
                (refs, records, total, Pagination::new(1, total.max(1), total))
            }
        };
        return Ok(Collected {
            table: build_table(&records, &refs, detailed),
            stats: T::stats(&records, total),
            pagination,
            records: to_value(&records)?,
        });
    }

    let query = Query::new();
    let (refs, fetched) = futures::try_join!(refs, client.get_page::<T>(&route, &query))?;
    let records = local_filter(fetched.data);
    let total = records.len();
    let pagination = match window {
        Window::Page { page, per_page } => Pagination::new(page, per_page, total),
        Window::All => Pagination::new(1, total.max(1), total),
    };
    let shown = pagination.slice(&records);
    Ok(Collected {
        table: build_table(shown, &refs, detailed),
        stats: T::stats(&records, total),
        pagination,
        records: to_value(shown)?,
    })
}

async fn collect_consumables(
    client: &ApiClient,
    filters: &BTreeMap<String, String>,
    window: Window,
) -> Result<Collected, ResourceError> {
    let kind = ResourceKind::Consumables;
    let query = filter_query(filters);
    let (page, per_page) = match window {
        Window::Page { page, per_page } => (page, per_page),
        Window::All => {
            let probe = consumables::fetch(client, &query.clone().push("page", 1).push("per_page", 1)).await?;
            (1, probe.total_count.max(1))
        }
    };
    let paged = query.push("page", page).push("per_page", per_page);
    let (refs, fetched) = futures::try_join!(
        ReferenceData::load(client, kind.needs()),
        consumables::fetch(client, &paged),
    )?;
    let mut table = Table::new(consumables::Consumable::headers());
    for record in &fetched.records {
        table.push(record.cells(&refs));
    }
    Ok(Collected {
        table,
        stats: stats::consumables(fetched.total_count, fetched.ink_kgs, fetched.solvent_kgs),
        pagination: Pagination::new(page, per_page, fetched.total_count),
        records: to_value(&fetched.records)?,
    })
}

fn keep<T>(records: Vec<T>) -> Vec<T> {
    records
}

async fn dispatch(
    client: &ApiClient,
    kind: ResourceKind,
    filters: &BTreeMap<String, String>,
    window: Window,
    detailed: bool,
) -> Result<Collected, ResourceError> {
    kind.check_filters(filters)?;
    match kind {
        ResourceKind::Jobs => collect::<Job, _>(client, kind, filters, window, detailed, keep).await,
        ResourceKind::OutputRolls => {
            collect::<OutputRoll, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::InputRolls => {
            let filter =
                InputRollFilter::from_pairs(filters).map_err(ResourceError::InvalidFilter)?;
            collect::<InputRoll, _>(client, kind, filters, window, detailed, |rolls| {
                filter.apply(rolls)
            })
            .await
        }
        ResourceKind::Downtimes => {
            collect::<Downtime, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::Scraps => collect::<Scrap, _>(client, kind, filters, window, detailed, keep).await,
        ResourceKind::InkUsages => {
            collect::<InkUsage, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::SolventUsages => {
            collect::<SolventUsage, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::Consumables => collect_consumables(client, filters, window).await,
        ResourceKind::Machines => {
            collect::<Machine, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::Sections => {
            collect::<Section, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::Materials => {
            collect::<Material, _>(client, kind, filters, window, detailed, keep).await
        }
        ResourceKind::Users => collect::<User, _>(client, kind, filters, window, detailed, keep).await,
        ResourceKind::Roles => collect::<Role, _>(client, kind, filters, window, detailed, keep).await,
        ResourceKind::Lookup(_) => {
            collect::<Lookup, _>(client, kind, filters, window, detailed, keep).await
        }
    }
}

/// One page of `kind` with its stats banner and paging footer.
pub async fn list(
    client: &ApiClient,
    kind: ResourceKind,
    request: &ListRequest,
) -> Result<Listing, ResourceError> {
    let window = Window::Page {
        page: request.page.max(1),
        per_page: request.per_page.max(1),
    };
    let collected = dispatch(client, kind, &request.filters, window, request.detailed).await?;
    let total = collected.pagination.total;
    let per_page_options = per_page_options(total, clamp_per_page(request.per_page, total));
    Ok(Listing {
        table: collected.table,
        stats: collected.stats,
        pagination: collected.pagination,
        per_page_options,
        records: collected.records,
    })
}

/// The whole filtered set of `kind`, with detail columns.
pub async fn export(
    client: &ApiClient,
    kind: ResourceKind,
    filters: &BTreeMap<String, String>,
) -> Result<(Table, Value), ResourceError> {
    let collected = dispatch(client, kind, filters, Window::All, true).await?;
    Ok((collected.table, collected.records))
}

fn mutable_base(kind: ResourceKind) -> Result<String, ResourceError> {
    kind.base_route().ok_or_else(|| ResourceError::ReadOnly {
        resource: kind.name().to_string(),
    })
}

fn prepare(kind: ResourceKind, doc: Value) -> Result<Value, ResourceError> {
    if !doc.is_object() {
        return Err(ResourceError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }
    match kind {
        ResourceKind::Downtimes => payload::prepare_downtime(doc),
        ResourceKind::Scraps => payload::prepare_scrap(doc),
        _ => Ok(doc),
    }
    .map_err(ResourceError::InvalidPayload)
}

pub async fn create(
    client: &ApiClient,
    kind: ResourceKind,
    doc: Value,
) -> Result<Value, ResourceError> {
    let route = format!("{}/create", mutable_base(kind)?);
    let doc = prepare(kind, doc)?;
    Ok(client.post_json(&route, &doc).await?)
}

pub async fn update(
    client: &ApiClient,
    kind: ResourceKind,
    doc: Value,
) -> Result<Value, ResourceError> {
    let route = format!("{}/update", mutable_base(kind)?);
    let has_id = doc.get("id").and_then(Value::as_i64).is_some_and(|id| id > 0);
    if !has_id {
        return Err(ResourceError::MissingId {
            resource: kind.name().to_string(),
        });
    }
    let doc = prepare(kind, doc)?;
    Ok(client.put_json(&route, &doc).await?)
}

pub async fn delete(
    client: &ApiClient,
    kind: ResourceKind,
    id: i64,
) -> Result<Value, ResourceError> {
    let route = format!("{}/delete", mutable_base(kind)?);
    Ok(client.delete_json(&route, &IdPayload { id }).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_parse() {
        assert_eq!(ResourceKind::parse("Jobs").unwrap(), ResourceKind::Jobs);
        assert_eq!(
            ResourceKind::parse("rolls").unwrap(),
            ResourceKind::OutputRolls
        );
        assert_eq!(
            ResourceKind::parse("flag_reasons").unwrap(),
            ResourceKind::Lookup(LookupKind::FlagReasons)
        );
        assert!(matches!(
            ResourceKind::parse("pallets"),
            Err(ResourceError::UnknownResource { .. })
        ));
        for name in ResourceKind::names() {
            assert_eq!(ResourceKind::parse(name).unwrap().name(), name);
        }
    }

    #[test]
    fn routes_follow_the_backend_layout() {
        assert_eq!(
            ResourceKind::Jobs.list_route(),
            "/api/jobs/filter-with-input-rolls"
        );
        assert_eq!(
            ResourceKind::InkUsages.list_route(),
            "/api/ink-usages/filter"
        );
        assert_eq!(
            ResourceKind::Lookup(LookupKind::ScrapTypes).base_route().unwrap(),
            "/api/lookups/scrap-types"
        );
        assert_eq!(ResourceKind::Consumables.base_route(), None);
        assert!(!ResourceKind::InputRolls.is_paginated());
        assert!(ResourceKind::Consumables.is_paginated());
    }

    #[test]
    fn unknown_filter_keys_are_rejected() {
        let mut filters = BTreeMap::new();
        filters.insert("shift_id".to_string(), "1".to_string());
        assert!(ResourceKind::Downtimes.check_filters(&filters).is_ok());

        filters.insert("colour_id".to_string(), "3".to_string());
        let err = ResourceKind::Downtimes.check_filters(&filters).unwrap_err();
        assert!(err.to_string().contains("'colour_id' is not a filter for downtimes"));

        let err = ResourceKind::Roles.check_filters(&filters).unwrap_err();
        assert!(err.to_string().contains("allowed: none"));
    }

    #[test]
    fn filter_query_skips_blank_values() {
        let mut filters = BTreeMap::new();
        filters.insert("shift_id".to_string(), "2".to_string());
        filters.insert("created_by".to_string(), "  ".to_string());
        let query = filter_query(&filters);
        assert_eq!(query.get("shift_id"), Some("2"));
        assert_eq!(query.get("created_by"), None);
    }

    #[test]
    fn payload_must_be_an_object() {
        assert!(matches!(
            prepare(ResourceKind::Machines, serde_json::json!([1])),
            Err(ResourceError::InvalidPayload(_))
        ));
    }
}
