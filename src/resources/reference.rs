use itertools::Itertools;
use serde::de::DeserializeOwned;

use crate::client::{ApiClient, ClientError, Query};
use crate::models::{Id, Identified, Lookup, Machine, Role, Section, User};
use crate::utils;

/// Which reference lists a listing joins against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Needs {
    pub users: bool,
    pub machines: bool,
    pub sections: bool,
    pub roles: bool,
    pub shifts: bool,
    pub colours: bool,
    pub solvent_types: bool,
    pub scrap_types: bool,
    pub downtime_reasons: bool,
}

/// Cached lists used to turn ids into names.
#[derive(Clone, Debug, Default)]
pub struct ReferenceData {
    pub users: Vec<User>,
    pub machines: Vec<Machine>,
    pub sections: Vec<Section>,
    pub roles: Vec<Role>,
    pub shifts: Vec<Lookup>,
    pub colours: Vec<Lookup>,
    pub solvent_types: Vec<Lookup>,
    pub scrap_types: Vec<Lookup>,
    pub downtime_reasons: Vec<Lookup>,
}

async fn fetch_if<T: DeserializeOwned>(
    client: &ApiClient,
    needed: bool,
    path: &str,
) -> Result<Vec<T>, ClientError> {
    if !needed {
        return Ok(Vec::new());
    }
    Ok(client.get_page::<T>(path, &Query::new()).await?.data)
}

fn find<T: Identified>(items: &[T], id: Id) -> Option<&T> {
    items.iter().find(|i| i.id() == id)
}

impl ReferenceData {
    /// Loads every list in `needs` concurrently; the first failure wins.
    pub async fn load(client: &ApiClient, needs: Needs) -> Result<Self, ClientError> {
        let (users, machines, sections, roles, shifts, colours, solvent_types, scrap_types, downtime_reasons) = futures::try_join!(
            fetch_if::<User>(client, needs.users, "/api/users"),
            fetch_if::<Machine>(client, needs.machines, "/api/machines"),
            fetch_if::<Section>(client, needs.sections, "/api/sections"),
            fetch_if::<Role>(client, needs.roles, "/api/roles"),
            fetch_if::<Lookup>(client, needs.shifts, "/api/lookups/shifts"),
            fetch_if::<Lookup>(client, needs.colours, "/api/lookups/colours"),
            fetch_if::<Lookup>(client, needs.solvent_types, "/api/lookups/solvent-types"),
            fetch_if::<Lookup>(client, needs.scrap_types, "/api/lookups/scrap-types"),
            fetch_if::<Lookup>(client, needs.downtime_reasons, "/api/lookups/downtime-reasons"),
        )?;
        Ok(Self {
            users,
            machines,
            sections,
            roles,
            shifts,
            colours,
            solvent_types,
            scrap_types,
            downtime_reasons,
        })
    }

    pub fn user_name(&self, id: Id) -> String {
        find(&self.users, id)
            .map(|u| u.full_name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn machine_name(&self, id: Id) -> String {
        find(&self.machines, id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn section_names(&self, ids: &[Id]) -> String {
        if ids.is_empty() {
            return "-".to_string();
        }
        ids.iter()
            .map(|id| {
                find(&self.sections, *id)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| format!("#{id}"))
            })
            .join(", ")
    }

    pub fn shift_name(&self, id: Id) -> String {
        find(&self.shifts, id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| utils::shift_label(id).to_string())
    }

    pub fn colour_name(&self, id: Id) -> String {
        lookup_name(&self.colours, id)
    }

    pub fn solvent_type_name(&self, id: Id) -> String {
        lookup_name(&self.solvent_types, id)
    }

    pub fn scrap_type_name(&self, id: Id) -> String {
        lookup_name(&self.scrap_types, id)
    }

    pub fn downtime_reason_name(&self, id: Id) -> String {
        lookup_name(&self.downtime_reasons, id)
    }
}

fn lookup_name(items: &[Lookup], id: Id) -> String {
    find(items, id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("#{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_fall_back_to_ids() {
        let refs = ReferenceData {
            users: vec![User {
                id: 3,
                full_name: "Ada Obi".to_string(),
                ..User::default()
            }],
            colours: vec![Lookup {
                id: 1,
                name: "Cyan".to_string(),
            }],
            ..ReferenceData::default()
        };
        assert_eq!(refs.user_name(3), "Ada Obi");
        assert_eq!(refs.user_name(4), "#4");
        assert_eq!(refs.colour_name(1), "Cyan");
        assert_eq!(refs.shift_name(2), "Night");
        assert_eq!(refs.section_names(&[]), "-");
    }
}
