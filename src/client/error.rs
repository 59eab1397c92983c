use thiserror::Error;

pub const SLOW_NETWORK_MESSAGE: &str = "No or slow internet, refresh or try again";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// Specific keys precede the generic ones that would otherwise shadow them.
const DB_ERRORS: &[(&str, &str)] = &[
    ("UNIQUE constraint failed: machines.name", "Routing Name already exists"),
    ("UNIQUE constraint failed: machines.label", "Routing Code already exists"),
    ("UNIQUE constraint failed: users.staffid", "Staff ID already exists"),
    ("UNIQUE constraint failed: users.phone_number", "Phone number already exists"),
    ("UNIQUE constraint failed: shifts.name", "Shift name already exists"),
    ("UNIQUE constraint failed: colours.name", "Colour name already exists"),
    ("UNIQUE constraint failed: solvent_types.name", "Solvent type name already exists"),
    ("UNIQUE constraint failed: scrap_types.name", "Scrap type name already exists"),
    ("UNIQUE constraint failed: downtime_reasons.name", "Downtime reason name already exists"),
    ("UNIQUE constraint failed: flag_reasons.name", "Flag reason name already exists"),
    ("UNIQUE constraint failed: roles.name", "Role name already exists"),
    ("UNIQUE constraint failed: permissions.codename", "Permission codename already exists"),
    ("UNIQUE constraint failed: rolls.output_roll_no", "Output roll number already exists"),
    ("UNIQUE constraint failed: jobs.batch_roll_no", "Batch roll number already exists"),
    ("UNIQUE constraint failed: content_type.model", "Content type model already exists"),
    (
        "UNIQUE constraint failed: user_machines.user_id, user_machines.machine_id",
        "User is already assigned to this machine",
    ),
    (
        "UNIQUE constraint failed: role_permissions.role_id, role_permissions.permission_id",
        "Permission is already assigned to this role",
    ),
    ("FOREIGN KEY constraint failed: users.role_id", "Role not found"),
    ("FOREIGN KEY constraint failed: jobs.shift_id", "Shift not found"),
    ("FOREIGN KEY constraint failed: jobs.machine_id", "Machine not found"),
    ("FOREIGN KEY constraint failed: jobs.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: rolls.job_id", "Job not found"),
    ("FOREIGN KEY constraint failed: rolls.flag_reason_id", "Flag reason not found"),
    ("FOREIGN KEY constraint failed: rolls.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: downtimes.shift_id", "Shift not found"),
    ("FOREIGN KEY constraint failed: downtimes.downtime_reason_id", "Downtime reason not found"),
    ("FOREIGN KEY constraint failed: downtimes.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: scraps.shift_id", "Shift not found"),
    ("FOREIGN KEY constraint failed: scraps.scrap_type_id", "Scrap type not found"),
    ("FOREIGN KEY constraint failed: scraps.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: ink_usages.shift_id", "Shift not found"),
    ("FOREIGN KEY constraint failed: ink_usages.colour_id", "Colour not found"),
    ("FOREIGN KEY constraint failed: ink_usages.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: solvent_usages.shift_id", "Shift not found"),
    ("FOREIGN KEY constraint failed: solvent_usages.solvent_type_id", "Solvent type not found"),
    ("FOREIGN KEY constraint failed: solvent_usages.created_by", "User not found"),
    ("FOREIGN KEY constraint failed: user_machines.user_id", "User not found"),
    ("FOREIGN KEY constraint failed: user_machines.machine_id", "Machine not found"),
    ("FOREIGN KEY constraint failed: role_permissions.role_id", "Role not found"),
    ("FOREIGN KEY constraint failed: role_permissions.permission_id", "Permission not found"),
    ("FOREIGN KEY constraint failed: permissions.content_type_id", "Content type not found"),
    ("FOREIGN KEY constraint failed", "Related record not found"),
    ("NOT NULL constraint failed: users.full_name", "Full name is required"),
    ("NOT NULL constraint failed: users.staffid", "Staff ID is required"),
    ("NOT NULL constraint failed: users.password", "Password is required"),
    ("NOT NULL constraint failed: users.status", "Status is required"),
    ("NOT NULL constraint failed: users.role_id", "Role is required"),
    ("NOT NULL constraint failed: jobs.shift_id", "Shift is required"),
    ("NOT NULL constraint failed: jobs.production_order", "Production order is required"),
    ("NOT NULL constraint failed: jobs.batch_roll_no", "Batch roll number is required"),
    ("NOT NULL constraint failed: jobs.start_weight", "Start weight is required"),
    ("NOT NULL constraint failed: jobs.start_meter", "Start meter is required"),
    ("NOT NULL constraint failed: rolls.output_roll_no", "Output roll number is required"),
    ("NOT NULL constraint failed: rolls.final_meter", "Final meter is required"),
    ("NOT NULL constraint failed: rolls.final_weight", "Final weight is required"),
    ("NOT NULL constraint failed: downtimes.shift_id", "Shift is required"),
    ("NOT NULL constraint failed: downtimes.start_time", "Start time is required"),
    ("NOT NULL constraint failed: downtimes.end_time", "End time is required"),
    ("NOT NULL constraint failed: downtimes.duration_minutes", "Duration is required"),
    ("NOT NULL constraint failed: downtimes.downtime_reason_id", "Downtime reason is required"),
    ("NOT NULL constraint failed: scraps.shift_id", "Shift is required"),
    ("NOT NULL constraint failed: scraps.time", "Time is required"),
    ("NOT NULL constraint failed: scraps.scrap_type_id", "Scrap type is required"),
    ("NOT NULL constraint failed: scraps.weight_kg", "Weight is required"),
    ("NOT NULL constraint failed: ink_usages.shift_id", "Shift is required"),
    ("NOT NULL constraint failed: ink_usages.colour_id", "Colour is required"),
    ("NOT NULL constraint failed: ink_usages.batch_code", "Batch code is required"),
    ("NOT NULL constraint failed: ink_usages.kgs_issued", "Kgs issued is required"),
    ("NOT NULL constraint failed: solvent_usages.shift_id", "Shift is required"),
    ("NOT NULL constraint failed: solvent_usages.solvent_type_id", "Solvent type is required"),
    ("NOT NULL constraint failed: solvent_usages.kgs_issued", "Kgs issued is required"),
    ("no such table", "Database table not found"),
    ("record not found", "Record not found"),
    ("not found", "Record not found"),
    ("cannot delete", "Cannot delete this record"),
    ("database is locked", "Database is busy, please try again"),
    ("disk I/O error", "Storage error occurred"),
];

/// Maps a raw database constraint message to operator-facing text. The first
/// table entry contained in `raw` wins; anything unmatched is returned as is.
pub fn format_db_error(raw: &str) -> String {
    DB_ERRORS
        .iter()
        .find(|(key, _)| raw.contains(key))
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() || err.is_connect() {
        return SLOW_NETWORK_MESSAGE.to_string();
    }
    let text = err.to_string();
    let lower = text.to_lowercase();
    if lower.contains("failed to fetch") || lower.contains("aborterror") || lower.contains("aborted")
    {
        return SLOW_NETWORK_MESSAGE.to_string();
    }
    text
}

/// Pulls `message` or `error` out of a JSON error body, else the body itself.
pub fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}
