use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::reference::ReferenceData;
use super::stats;
use crate::models::{
    Downtime, InkUsage, InputRoll, Job, Lookup, Machine, Material, OutputRoll, Role, Scrap,
    Section, SolventUsage, User,
};
use crate::utils::{
    format_date, format_date_time, format_downtime, format_meter, format_time, format_weight,
    truncate_text,
};

/// A listable record: table columns, joined cells and its stats banner.
pub trait Record: DeserializeOwned + Serialize + Clone {
    fn headers(detailed: bool) -> Vec<&'static str>;
    fn cells(&self, refs: &ReferenceData, detailed: bool) -> Vec<String>;
    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)>;
}

fn opt_weight(v: Option<f64>) -> String {
    v.map(format_weight).unwrap_or_else(|| "-".to_string())
}

fn opt_text(v: Option<&str>) -> String {
    match v {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "-".to_string(),
    }
}

impl Record for Job {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec![
            "ID",
            "Production Order",
            "Batch",
            "Machine",
            "Shift",
            "Start Weight",
            "Start Meter",
            "Consumed",
            "Status",
            "Created By",
            "Created",
        ]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.production_order.clone(),
            self.batch.clone(),
            refs.machine_name(self.machine_id),
            refs.shift_name(self.shift_id),
            self.start_weight_kg()
                .map(format_weight)
                .unwrap_or_else(|| self.start_weight.clone()),
            self.start_meter
                .map(format_meter)
                .unwrap_or_else(|| "-".to_string()),
            opt_weight(self.consumed_weight),
            if self.is_active() { "Active" } else { "Completed" }.to_string(),
            refs.user_name(self.created_by),
            format_time(Some(&self.created_at)),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::jobs(records, total_count)
    }
}

impl Record for OutputRoll {
    fn headers(detailed: bool) -> Vec<&'static str> {
        let mut h = vec![
            "ID",
            "Batch",
            "Input Batch",
            "Meter",
            "Weight",
            "Core",
            "Flags",
            "Operator",
            "Created",
        ];
        if detailed {
            h.extend(["Job", "Input Roll", "Flag Count", "Updated"]);
        }
        h
    }

    fn cells(&self, refs: &ReferenceData, detailed: bool) -> Vec<String> {
        let operator = match self.operator_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => refs.user_name(self.created_by),
        };
        let mut c = vec![
            self.id.to_string(),
            self.output_batch.clone(),
            self.from_input_batch.clone(),
            format_meter(self.final_meter),
            if self.is_pending() {
                "Pending".to_string()
            } else {
                format_weight(self.final_weight)
            },
            opt_weight(self.core_weight),
            truncate_text(self.flag_reason.as_deref(), 30),
            operator,
            format_time(Some(&self.created_at)),
        ];
        if detailed {
            c.extend([
                self.job_id.to_string(),
                self.input_roll_id.to_string(),
                self.flag_count.to_string(),
                format_time(Some(&self.updated_at)),
            ]);
        }
        c
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::output_rolls(records, total_count)
    }
}

impl Record for InputRoll {
    fn headers(detailed: bool) -> Vec<&'static str> {
        let mut h = vec![
            "ID",
            "Batch",
            "Process Order",
            "Material",
            "Start Weight",
            "Consumed",
            "Status",
            "Created By",
            "Created",
        ];
        if detailed {
            h.extend([
                "Material Document",
                "Description",
                "Start Meter",
                "Job",
                "Updated",
            ]);
        }
        h
    }

    fn cells(&self, refs: &ReferenceData, detailed: bool) -> Vec<String> {
        let start = self
            .start_weight
            .trim()
            .parse::<f64>()
            .map(format_weight)
            .unwrap_or_else(|_| self.start_weight.clone());
        let mut c = vec![
            self.id.to_string(),
            self.batch.clone(),
            opt_text(self.process_order.as_deref()),
            opt_text(self.material_number.as_deref()),
            start,
            opt_weight(self.consumed_weight),
            if self.is_consumed() { "Consumed" } else { "Open" }.to_string(),
            refs.user_name(self.created_by),
            format_time(Some(&self.created_at)),
        ];
        if detailed {
            c.extend([
                opt_text(self.material_document.as_deref()),
                truncate_text(self.material_description.as_deref(), 40),
                self.start_meter
                    .map(format_meter)
                    .unwrap_or_else(|| "-".to_string()),
                self.job_id.to_string(),
                format_time(Some(&self.updated_at)),
            ]);
        }
        c
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::input_rolls(records, total_count)
    }
}

impl Record for Downtime {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Shift", "Reason", "Start", "End", "Duration", "Created By"]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            refs.shift_name(self.shift_id),
            refs.downtime_reason_name(self.downtime_reason_id),
            format_time(Some(&self.start_time)),
            format_time(Some(&self.end_time)),
            format_downtime(self.duration_minutes),
            refs.user_name(self.created_by),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::downtimes(records, total_count)
    }
}

impl Record for Scrap {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Shift", "Time", "Type", "Weight", "Notes", "Created By"]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            refs.shift_name(self.shift_id),
            format_time(Some(&self.time)),
            refs.scrap_type_name(self.scrap_type_id),
            format_weight(self.weight_kg),
            truncate_text(self.notes.as_deref(), 30),
            refs.user_name(self.created_by),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::scraps(records, total_count)
    }
}

impl Record for InkUsage {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec![
            "ID",
            "Shift",
            "Colour",
            "Batch Code",
            "Kgs Issued",
            "Created By",
            "Created",
        ]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            refs.shift_name(self.shift_id),
            refs.colour_name(self.colour_id),
            self.batch_code.clone(),
            format_weight(self.kgs_issued),
            refs.user_name(self.created_by),
            format_time(Some(&self.created_at)),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::issued("Records", records.iter().map(|r| r.kgs_issued), total_count)
    }
}

impl Record for SolventUsage {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec![
            "ID",
            "Shift",
            "Solvent Type",
            "Kgs Issued",
            "Created By",
            "Created",
        ]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            refs.shift_name(self.shift_id),
            refs.solvent_type_name(self.solvent_type_id),
            format_weight(self.kgs_issued),
            refs.user_name(self.created_by),
            format_time(Some(&self.created_at)),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::issued("Records", records.iter().map(|r| r.kgs_issued), total_count)
    }
}

impl Record for Machine {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec![
            "ID",
            "Routing Name",
            "Routing Code",
            "Section",
            "Order Types",
            "Users",
            "Jobs",
        ]
    }

    fn cells(&self, _refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.label.clone(),
            self.section_name.clone(),
            opt_text(self.section_order_types.as_deref()),
            self.user_count.to_string(),
            self.job_count.to_string(),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::machines(records, total_count)
    }
}

impl Record for Section {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Name", "Machines", "Users", "Jobs", "Order Type", "PO Codes"]
    }

    fn cells(&self, _refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.machine_count.to_string(),
            self.user_count.to_string(),
            self.job_count.to_string(),
            self.order_type_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if self.po_code_ids.is_empty() {
                "-".to_string()
            } else {
                self.po_code_ids.iter().join(", ")
            },
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::sections(records, total_count)
    }
}

impl Record for Material {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Code", "Key", "Description", "Created"]
    }

    fn cells(&self, _refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.code.clone(),
            self.key.clone(),
            truncate_text(Some(&self.value), 40),
            format_date_time(&self.created_at),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::materials(records, total_count)
    }
}

impl Record for User {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec![
            "ID", "Name", "Staff ID", "Phone", "Role", "Status", "Page", "Sections", "Created",
        ]
    }

    fn cells(&self, refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name.clone(),
            self.staffid.clone(),
            opt_text(self.phone_number.as_deref()),
            self.role_name.clone(),
            self.status.clone(),
            self.page_id.clone(),
            refs.section_names(&self.section_ids),
            format_date(&self.created_at),
        ]
    }

    fn stats(records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::users(records, total_count)
    }
}

impl Record for Role {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Name", "Description"]
    }

    fn cells(&self, _refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            truncate_text(self.description.as_deref(), 50),
        ]
    }

    fn stats(_records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::total_only(total_count)
    }
}

impl Record for Lookup {
    fn headers(_detailed: bool) -> Vec<&'static str> {
        vec!["ID", "Name"]
    }

    fn cells(&self, _refs: &ReferenceData, _detailed: bool) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone()]
    }

    fn stats(_records: &[Self], total_count: usize) -> Vec<(String, String)> {
        stats::total_only(total_count)
    }
}
