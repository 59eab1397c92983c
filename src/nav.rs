use crate::client::{ApiClient, ClientError, Query};
use crate::models::{Role, User};

const DASHBOARD_MENU: [&str; 3] = ["Dashboard", "Jobs", "Rolls"];
const PRODUCTION_MENU: [&str; 4] = ["Production", "Downtime", "Scrap", "Actual Consumable"];
const SETTINGS_MENU: [&str; 8] = [
    "Settings",
    "Materials",
    "Machines",
    "Sections",
    "Manage Lookups",
    "Users Management",
    "Roles & Permissions",
    "Logout",
];

/// One navigation entry and the command that opens it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub command: &'static str,
}

fn command_for(label: &str) -> &'static str {
    match label {
        "Dashboard" => "floortrack dashboard",
        "Jobs" => "floortrack list jobs",
        "Rolls" => "floortrack list output-rolls",
        "Production" => "floortrack production",
        "Downtime" => "floortrack list downtimes",
        "Scrap" => "floortrack list scraps",
        "Actual Consumable" => "floortrack list consumables",
        "Settings" => "floortrack hardware settings",
        "Materials" => "floortrack list materials",
        "Machines" => "floortrack list machines",
        "Sections" => "floortrack list sections",
        "Manage Lookups" => "floortrack list <lookup>",
        "Users Management" => "floortrack list users",
        "Roles & Permissions" => "floortrack list roles",
        _ => "-",
    }
}

fn items(labels: &[&'static str]) -> Vec<MenuItem> {
    labels
        .iter()
        .map(|label| MenuItem {
            label,
            command: command_for(label),
        })
        .collect()
}

/// Roles named after a menu group only see that group; everyone else gets
/// the whole menu.
pub fn menu_for_role(role_name: Option<&str>) -> Vec<MenuItem> {
    match role_name {
        Some("Dashboard") => items(&DASHBOARD_MENU),
        Some("Production") => items(&PRODUCTION_MENU),
        Some("Settings") => items(&SETTINGS_MENU),
        _ => {
            let mut all = items(&DASHBOARD_MENU);
            all.extend(items(&PRODUCTION_MENU));
            all.extend(items(&SETTINGS_MENU));
            all
        }
    }
}

/// The signed-in user and the name of their role, if the role still exists.
pub async fn whoami(client: &ApiClient) -> Result<(User, Option<String>), ClientError> {
    let user: User = client.get_json("/api/users/me", &Query::new()).await?;
    let roles = client.get_page::<Role>("/api/roles", &Query::new()).await?;
    let role_name = roles
        .data
        .into_iter()
        .find(|r| r.id == user.role_id)
        .map(|r| r.name);
    Ok((user, role_name))
}
