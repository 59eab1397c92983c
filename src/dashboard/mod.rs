use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::client::{ApiClient, ClientError, Page, Query};
use crate::models::{Downtime, Job, OutputRoll, Scrap};
use crate::output::{self, Table};
use crate::resources::ReferenceData;
use crate::utils::{
    current_shift, format_downtime, format_meter, format_time, format_weight, shift_label,
};

const RECENT_LIMIT: usize = 5;

/// Totals for one shift on one day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShiftOverview {
    pub shift_id: i64,
    pub date: Option<NaiveDate>,
    pub jobs: usize,
    pub rolls: usize,
    pub downtime_minutes: i64,
    pub scrap_kg: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recent {
    pub jobs: Vec<Job>,
    pub rolls: Vec<OutputRoll>,
    pub downtimes: Vec<Downtime>,
    pub scraps: Vec<Scrap>,
}

fn shift_query(shift_id: i64, date: NaiveDate) -> Query {
    let day = date.format("%Y-%m-%d").to_string();
    Query::new()
        .push("shift_id", shift_id)
        .push("start_date", &day)
        .push("end_date", &day)
}

pub async fn shift_overview(
    client: &ApiClient,
    shift_id: i64,
    date: NaiveDate,
) -> Result<ShiftOverview, ClientError> {
    let query = shift_query(shift_id, date);
    let (jobs, rolls, downtimes, scraps) = futures::try_join!(
        client.get_page::<Job>("/api/jobs/filter-with-input-rolls", &query),
        client.get_page::<OutputRoll>("/api/output-rolls/filter", &query),
        client.get_page::<Downtime>("/api/downtimes/filter", &query),
        client.get_page::<Scrap>("/api/scraps/filter", &query),
    )?;
    Ok(ShiftOverview {
        shift_id,
        date: Some(date),
        jobs: jobs.total_count,
        rolls: rolls.total_count,
        downtime_minutes: downtimes.data.iter().map(|d| d.duration_minutes).sum(),
        scrap_kg: scraps.data.iter().map(|s| s.weight_kg).sum(),
    })
}

pub async fn recent(client: &ApiClient) -> Result<Recent, ClientError> {
    let query = Query::new().push("per_page", RECENT_LIMIT).push("page", 1);
    let (jobs, rolls, downtimes, scraps): (Page<Job>, Page<OutputRoll>, Page<Downtime>, Page<Scrap>) =
        futures::try_join!(
            client.get_page("/api/jobs/filter-with-input-rolls", &query),
            client.get_page("/api/output-rolls/filter", &query),
            client.get_page("/api/downtimes/filter", &query),
            client.get_page("/api/scraps/filter", &query),
        )?;
    Ok(Recent {
        jobs: jobs.data,
        rolls: rolls.data,
        downtimes: downtimes.data,
        scraps: scraps.data,
    })
}

/// Looks an output roll up by its printed roll number.
pub async fn find_roll(
    client: &ApiClient,
    roll_number: &str,
) -> Result<Option<OutputRoll>, ClientError> {
    let roll_number = roll_number.trim();
    if roll_number.is_empty() {
        return Ok(None);
    }
    debug!("looking up output roll {}", roll_number);
    let query = Query::new()
        .push("output_roll_no", roll_number)
        .push("per_page", 1);
    let page = client
        .get_page::<OutputRoll>("/api/output-rolls/filter", &query)
        .await?;
    Ok(page.data.into_iter().next())
}

/// Overview for the shift running right now.
pub async fn current_overview(client: &ApiClient) -> Result<ShiftOverview, ClientError> {
    shift_overview(client, current_shift(), Local::now().date_naive()).await
}

pub fn print_overview(overview: &ShiftOverview) {
    let date = overview
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    output::info(&format!(
        "{} Shift, {}",
        shift_label(overview.shift_id),
        date
    ));
    output::kv_line("Jobs", &overview.jobs.to_string());
    output::kv_line("Output rolls", &overview.rolls.to_string());
    output::kv_line("Downtime", &format_downtime(overview.downtime_minutes));
    output::kv_line("Scrap", &format_weight(overview.scrap_kg));
}

pub fn print_recent(recent: &Recent, refs: &ReferenceData) {
    let mut jobs = Table::new(["Job", "Machine", "Production Order", "Shift", "Started"]);
    for job in &recent.jobs {
        jobs.push(vec![
            job.id.to_string(),
            refs.machine_name(job.machine_id),
            job.production_order.clone(),
            shift_label(job.shift_id).to_string(),
            format_time(job.start_datetime.as_deref().or(Some(&job.created_at))),
        ]);
    }
    let mut rolls = Table::new(["Roll", "Weight", "Meter", "Created"]);
    for roll in &recent.rolls {
        rolls.push(vec![
            roll.output_batch.clone(),
            format_weight(roll.final_weight),
            format_meter(roll.final_meter),
            format_time(Some(&roll.created_at)),
        ]);
    }
    let mut downtimes = Table::new(["Reason", "Shift", "Duration", "Start"]);
    for d in &recent.downtimes {
        downtimes.push(vec![
            refs.downtime_reason_name(d.downtime_reason_id),
            shift_label(d.shift_id).to_string(),
            format_downtime(d.duration_minutes),
            format_time(Some(&d.start_time)),
        ]);
    }
    let mut scraps = Table::new(["Type", "Shift", "Weight", "Time"]);
    for s in &recent.scraps {
        scraps.push(vec![
            refs.scrap_type_name(s.scrap_type_id),
            shift_label(s.shift_id).to_string(),
            format_weight(s.weight_kg),
            format_time(Some(&s.time)),
        ]);
    }

    for (title, table) in [
        ("Recent jobs", jobs),
        ("Recent output rolls", rolls),
        ("Recent downtimes", downtimes),
        ("Recent scraps", scraps),
    ] {
        println!();
        output::info(title);
        if table.is_empty() {
            println!("  no records");
        } else {
            print!("{}", table.render());
        }
    }
}

pub fn print_roll(roll: &OutputRoll, refs: &ReferenceData) {
    output::kv_line("Roll", &roll.output_batch);
    output::kv_line("Input batch", &roll.from_input_batch);
    output::kv_line("Job", &roll.job_id.to_string());
    output::kv_line("Final weight", &format_weight(roll.final_weight));
    output::kv_line("Final meter", &format_meter(roll.final_meter));
    output::kv_line(
        "Core weight",
        &roll
            .core_weight
            .map(format_weight)
            .unwrap_or_else(|| "-".to_string()),
    );
    output::kv_line(
        "Flags",
        roll.flag_reason.as_deref().filter(|r| !r.is_empty()).unwrap_or("-"),
    );
    let operator = match roll.operator_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => refs.user_name(roll.created_by),
    };
    output::kv_line("Operator", &operator);
    output::kv_line("Created", &format_time(Some(&roll.created_at)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_query_pins_one_day() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 9).unwrap();
        let query = shift_query(2, date);
        assert_eq!(
            query.pairs(),
            &[
                ("shift_id".to_string(), "2".to_string()),
                ("start_date".to_string(), "2025-04-09".to_string()),
                ("end_date".to_string(), "2025-04-09".to_string()),
            ]
        );
    }
}
